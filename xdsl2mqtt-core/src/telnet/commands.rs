//! Commands issued to the modem shell

/// Line statistics command
pub const STATS_COMMAND: &str = "xdslctl info --stats";

/// Reboot command; its response is never awaited
pub const REBOOT_COMMAND: &str = "reboot";

/// Interface polled by default (the PTM data sub-interface)
pub const DEFAULT_INTERFACE: &str = "ptm0.1";

/// Builds the interface status command for `ifname`
#[must_use]
pub fn interface_command(ifname: &str) -> String {
    format!("ifconfig {ifname}")
}
