/// Per-session behavior switches.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Drop arrival records whose route id the catalog does not list.
    pub filter_unknown_routes: bool,
    /// Issue a refresh as soon as the session is bound, rather than waiting
    /// for the first refresh tick.
    pub refresh_on_bind: bool,
}

impl SessionConfig {
    pub fn with_route_filter(mut self, enabled: bool) -> Self {
        self.filter_unknown_routes = enabled;
        self
    }

    pub fn with_refresh_on_bind(mut self, enabled: bool) -> Self {
        self.refresh_on_bind = enabled;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            filter_unknown_routes: true,
            refresh_on_bind: true,
        }
    }
}
