#[cfg(test)]
pub mod test {
    use crate::schema::{OptionSpec, Schema};
    use crate::types::ValueType;

    /// A small server program's options, one per value source combination.
    ///
    /// Index order matters to tests that inspect `(index, value)` pairs.
    pub fn server_schema() -> Schema {
        Schema::new(vec![
            OptionSpec::new("port", ValueType::Int)
                .switch('p', "port")
                .env("APP_PORT")
                .key("server.port")
                .summary("port")
                .description("Port to listen on"),
            OptionSpec::new("name", ValueType::String)
                .switch('n', "name")
                .env("APP_NAME")
                .key("name")
                .summary("name")
                .description("Service name"),
            OptionSpec::new("verbose", ValueType::Boolean)
                .switch('v', "verbose")
                .env("APP_VERBOSE")
                .key("verbose")
                .description("Enable verbose output"),
            OptionSpec::new("listen", ValueType::IpAddress)
                .switch('l', "listen")
                .env("APP_LISTEN")
                .key("server.listen")
                .summary("addr")
                .description("Address to bind"),
            OptionSpec::new("tags", ValueType::Array)
                .switch('t', "tag")
                .env("APP_TAGS")
                .key("tags")
                .summary("tag")
                .description("Extra tags"),
            OptionSpec::new("log-dir", ValueType::String)
                .switch('d', "log-dir")
                .key("log-settings.directory")
                .summary("dir")
                .description("Log directory"),
            OptionSpec::new("config", ValueType::String)
                .switch('c', "config")
                .env("APP_CONFIG")
                .summary("file")
                .description("Config file path"),
        ])
        .unwrap()
    }

    pub fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    pub fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn server_schema_is_valid() {
        let schema = server_schema();
        assert_eq!(schema.len(), 7);
        assert_eq!(schema.options()[5].name, "log-dir");
        assert!(schema.get("log-dir").unwrap().env.is_none());
        assert!(schema.get("config").unwrap().key.is_none());
    }
}
