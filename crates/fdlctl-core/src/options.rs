//! Run options handed from the start request to the pipeline runner.

use serde::Deserialize;

/// Options selecting what one pipeline run should do.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOptions {
    /// Create the content archive on the remote game server instead of
    /// processing a local file.
    pub remote_source: bool,
    /// Take remote coordinates from server-side configuration rather
    /// than the caller.
    pub use_default_source: bool,
    /// Ask the pipeline to discard its cached archive before running.
    pub clear_cache: bool,
    /// Explicit remote coordinates. Ignored when `use_default_source`
    /// is set; required for a remote run when it is not.
    pub remote: Option<RemoteSource>,
}

/// Coordinates of the remote game server the pipeline pulls from.
///
/// `password` is a secret: it is passed to the pipeline process but
/// must never be reproduced in logged command lines.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSource {
    pub host: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub path: String,
}

fn default_ssh_port() -> u16 {
    22
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_source_defaults_ssh_port() {
        let remote: RemoteSource = serde_json::from_str(
            r#"{"host":"game.example.net","user":"steam","password":"pw","path":"/srv/cstrike"}"#,
        )
        .unwrap();
        assert_eq!(remote.port, 22);
    }

    #[test]
    fn options_default_to_local_run() {
        let opts = RunOptions::default();
        assert!(!opts.remote_source);
        assert!(!opts.clear_cache);
        assert!(opts.remote.is_none());
    }
}
