use agentic_security_core::contract::{AnalysisResponse, SecurityAlert};
use agentic_security_lambda::adapters::prompt_store::{PromptObject, PromptStore};
use agentic_security_lambda::handlers::analyze::{handle_alert, AnalyzerConfig};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing_subscriber::EnvFilter;

struct S3PromptStore {
    s3_client: aws_sdk_s3::Client,
}

impl PromptStore for S3PromptStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<PromptObject, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map_err(|error| format!("failed to read object from s3: {error}"))?;
                let version_id = output.version_id().map(str::to_string);
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|error| format!("failed to read s3 object body: {error}"))?
                    .into_bytes()
                    .to_vec();
                Ok::<_, String>(PromptObject { body, version_id })
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<SecurityAlert>) -> Result<AnalysisResponse, Error> {
    let config = AnalyzerConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3PromptStore {
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };

    handle_alert(&event.payload, &config, &store).map_err(|error| {
        tracing::error!(component = "analyzer", event = "alert_failed", %error);
        Error::from(error.to_string())
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .without_time()
        .with_current_span(false)
        .init();

    lambda_runtime::run(service_fn(handle_request)).await
}
