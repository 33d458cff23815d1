/* src/setup/gen_conf.rs */

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"[setup]
# off, error, warn, info, debug or trace
log_level = "info"

[network]
listen = "0.0.0.0"
port = 2222
# A write that makes no progress for this long fails the session.
write_timeout_secs = 300

[tarpit]
line_interval_ms = 1000
max_line_len = 32
# Uncomment to cut sessions off after a while.
# max_session_secs = 3600

[dashboard]
tick_ms = 500
log_capacity = 30
show_debug = false
"#;

// Writes the default configuration file, refusing to overwrite an existing one.
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let mut file = File::create_new(path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())
}
