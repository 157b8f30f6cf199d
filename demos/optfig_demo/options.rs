//! The demo's option declarations, written in TOML.

use optfig::{Schema, SchemaError};

const OPTIONS: &str = r#"
[[option]]
name = "config"
type = "string"
short = "c"
long = "config"
env = "OPTFIG_DEMO_CONFIG"
summary = "file"
description = "Read this config file instead of searching for one"

[[option]]
name = "listen"
type = "ip-address"
short = "l"
long = "listen"
env = "OPTFIG_DEMO_LISTEN"
key = "server.listen"
summary = "addr"
description = "Address to bind, host:port"

[[option]]
name = "workers"
type = "int"
short = "w"
long = "workers"
env = "OPTFIG_DEMO_WORKERS"
key = "server.workers"
summary = "count"
description = "Number of worker threads"

[[option]]
name = "admin-port"
type = "ip-port"
short = "a"
long = "admin-port"
key = "server.admin-port"
summary = "port"
description = "Port of the admin endpoint"

[[option]]
name = "tags"
type = "array"
short = "t"
long = "tag"
env = "OPTFIG_DEMO_TAGS"
key = "tags"
summary = "tag"
description = "Tag attached to every request"

[[option]]
name = "verbose"
type = "boolean"
short = "v"
long = "verbose"
env = "OPTFIG_DEMO_VERBOSE"
key = "verbose"
description = "Print where every value came from"

[[option]]
name = "log"
type = "string"
key = "log.target"

[[option.children]]
name = "dir"
type = "string"
short = "d"
long = "log-dir"
key = "log.directory"
summary = "dir"
description = "Directory for log files"
"#;

pub fn schema() -> Result<Schema, SchemaError> {
    Schema::from_toml_str(OPTIONS)
}
