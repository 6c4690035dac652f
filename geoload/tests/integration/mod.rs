mod pipeline_test;
mod retry_test;
