/// Connection preset for the RCON console, keyed by `name` in `servers.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPreset {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl ServerPreset {
    /// `host:port`, as shown next to the preset name.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
