// AWS Lambda binary entry point for the template macro
//
// Build with: cargo build -p phoenix-lambda
//
// The lambda_runtime crate provides the tokio runtime, so we use #[tokio::main]

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    phoenix_lambda::run().await
}
