use clap::Args;

use crate::cli::{ServerArgs, run_cli_async};
use crate::config::HdbgConfig;

#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    /// Debugger command line, e.g. `hdbg exec lm km`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    #[command(flatten)]
    pub server: ServerArgs,
}

pub async fn run(args: ExecArgs, config: &HdbgConfig) -> i32 {
    run_cli_async(|| async {
        let output = run_inner(&args, config).await?;
        println!("{output}");
        Ok(())
    })
    .await
}

async fn run_inner(args: &ExecArgs, config: &HdbgConfig) -> Result<String, String> {
    let client = args.server.client(config)?;
    client
        .exec_command(&args.command.join(" "))
        .await
        .map_err(|err| err.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_words_are_joined_into_one_command() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ExecCommand"))
            .and(query_param("command", "lm km"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nt  fffff800`12340000\n"))
            .expect(1)
            .mount(&server)
            .await;

        let args = ExecArgs {
            command: vec!["lm".to_string(), "km".to_string()],
            server: ServerArgs {
                server: Some(server.uri()),
                timeout: None,
            },
        };
        let output = run_inner(&args, &HdbgConfig::default()).await.unwrap();
        assert_eq!(output, "nt  fffff800`12340000");
    }

    #[tokio::test]
    async fn test_missing_command_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ExecCommand"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Missing command parameter"))
            .mount(&server)
            .await;

        let args = ExecArgs {
            command: vec![String::new()],
            server: ServerArgs {
                server: Some(server.uri()),
                timeout: None,
            },
        };
        let err = run_inner(&args, &HdbgConfig::default()).await.unwrap_err();
        assert!(err.contains("400"));
        assert!(err.contains("Missing command parameter"));
    }
}
