/// Source of the host machine's OS name. The engine only consults a probe
/// while resolving request defaults, never during strategy attempts, so tests
/// can script one to observe exactly when detection happens.
pub trait HostProbe: Send + Sync {
    fn os_name(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn os_name(&self) -> String {
        std::env::consts::OS.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_probe_reports_a_name() {
        assert!(!SystemProbe.os_name().is_empty());
    }
}
