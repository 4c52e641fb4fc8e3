use clap::Parser;
use invoker_server::ServerConfig;
use secrecy::ExposeSecret;

#[test]
fn flags_map_onto_bedrock_config() {
    let config = ServerConfig::try_parse_from([
        "invoker-server",
        "--host",
        "127.0.0.1",
        "--port",
        "9000",
        "--model-id",
        "anthropic.claude-3-5-sonnet-20240620-v1:0",
        "--region",
        "eu-west-1",
        "--temperature",
        "0.2",
        "--max-tokens",
        "512",
        "--endpoint",
        "http://localhost:4566",
        "--api-key",
        "token-123",
    ])
    .unwrap();

    assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9000");

    let bedrock = config.bedrock_config();
    assert_eq!(bedrock.model_id, "anthropic.claude-3-5-sonnet-20240620-v1:0");
    assert_eq!(bedrock.region, "eu-west-1");
    assert_eq!(bedrock.temperature, 0.2);
    assert_eq!(bedrock.max_tokens, 512);
    assert_eq!(bedrock.endpoint.as_deref(), Some("http://localhost:4566"));
    assert_eq!(
        bedrock.api_key.as_ref().map(|key| key.expose_secret().as_str()),
        Some("token-123")
    );
    assert!(bedrock.validate().is_ok());
}

#[test]
fn bad_host_is_invalid_config() {
    let config =
        ServerConfig::try_parse_from(["invoker-server", "--host", "not a host", "--port", "80"])
            .unwrap();

    let err = config.socket_addr().unwrap_err();
    assert!(err.to_string().contains("not a host"));
}
