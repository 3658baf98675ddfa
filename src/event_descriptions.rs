use std::collections::HashMap;

/// Short descriptions for well-known Windows event IDs, mostly from the
/// Security channel. Each entry is `"<id>) <text>"`; the table is parsed once
/// at startup.
static EVENT_DESCRIPTIONS: &[&str] = &[
    "1100) The event logging service has shut down",
    "1102) The audit log was cleared",
    "4608) Windows is starting up",
    "4616) The system time was changed",
    "4624) An account was successfully logged on",
    "4625) An account failed to log on",
    "4634) An account was logged off",
    "4647) User initiated logoff",
    "4648) A logon was attempted using explicit credentials",
    "4656) A handle to an object was requested",
    "4657) A registry value was modified",
    "4663) An attempt was made to access an object",
    "4672) Special privileges assigned to new logon",
    "4688) A new process has been created",
    "4689) A process has exited",
    "4697) A service was installed in the system",
    "4698) A scheduled task was created",
    "4699) A scheduled task was deleted",
    "4700) A scheduled task was enabled",
    "4702) A scheduled task was updated",
    "4719) System audit policy was changed",
    "4720) A user account was created",
    "4722) A user account was enabled",
    "4723) An attempt was made to change an account's password",
    "4724) An attempt was made to reset an account's password",
    "4725) A user account was disabled",
    "4726) A user account was deleted",
    "4728) A member was added to a security-enabled global group",
    "4732) A member was added to a security-enabled local group",
    "4738) A user account was changed",
    "4740) A user account was locked out",
    "4756) A member was added to a security-enabled universal group",
    "4768) A Kerberos authentication ticket (TGT) was requested",
    "4769) A Kerberos service ticket was requested",
    "4771) Kerberos pre-authentication failed",
    "4776) The computer attempted to validate the credentials for an account",
    "4778) A session was reconnected to a Window Station",
    "4779) A session was disconnected from a Window Station",
    "4798) A user's local group membership was enumerated",
    "4799) A security-enabled local group membership was enumerated",
    "5140) A network share object was accessed",
    "5145) A network share object was checked to see whether client can be granted desired access",
    "5156) The Windows Filtering Platform has permitted a connection",
    "7034) The service terminated unexpectedly",
    "7036) The service entered the running or stopped state",
    "7040) The start type of a service was changed",
    "7045) A service was installed in the system",
];

/// Names for the numeric `LogonType` values of logon events; holes are types
/// Windows never emits.
static LOGON_TYPES: [Option<&str>; 12] = [
    None,
    None,
    Some("Interactive"),
    Some("Network"),
    Some("Batch"),
    Some("Service"),
    None,
    Some("Unlock"),
    Some("NetworkCleartext"),
    Some("NewCredentials"),
    Some("RemoteInteractive"),
    Some("CachedInteractive"),
];

pub fn logon_type_name(logon_type: u32) -> Option<&'static str> {
    if logon_type > 11 {
        return None;
    }
    LOGON_TYPES[logon_type as usize]
}

/// Parses the leading decimal run of `s` as an event ID, with strtoul-style
/// whitespace skipping and wrapping unsigned semantics. Returns 0 when no
/// digits are found.
pub(crate) fn parse_leading_u16(s: &str) -> u16 {
    let mut value: u16 = 0;
    let mut saw_digit = false;

    for c in s.trim_start().chars() {
        let Some(digit) = c.to_digit(10) else { break };
        saw_digit = true;
        value = value.wrapping_mul(10).wrapping_add(digit as u16);
    }

    if saw_digit {
        value
    } else {
        0
    }
}

/// Event-ID to description lookup, built from `EVENT_DESCRIPTIONS` at
/// startup. One instance is shared (by reference) across all files parsed in
/// a run.
#[derive(Debug, Default)]
pub struct EventDescriptions(HashMap<u16, String>);

impl EventDescriptions {
    pub fn load() -> Self {
        let mut table = HashMap::with_capacity(EVENT_DESCRIPTIONS.len());

        for entry in EVENT_DESCRIPTIONS {
            let event_id = parse_leading_u16(entry);
            if event_id == 0 {
                continue;
            }

            let text = match entry.split_once(')') {
                Some((_, rest)) => rest.trim_start_matches([' ', ')']),
                None => continue,
            };

            table.insert(event_id, text.to_owned());
        }

        EventDescriptions(table)
    }

    pub fn get(&self, event_id: u16) -> Option<&str> {
        self.0.get(&event_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_loads_known_ids() {
        let descriptions = EventDescriptions::load();
        assert_eq!(
            descriptions.get(4624),
            Some("An account was successfully logged on")
        );
        assert_eq!(descriptions.get(1), None);
        assert!(!descriptions.is_empty());
    }

    #[test]
    fn test_parse_leading_u16() {
        assert_eq!(parse_leading_u16("4624) text"), 4624);
        assert_eq!(parse_leading_u16("4624"), 4624);
        assert_eq!(parse_leading_u16("  4624"), 4624);
        assert_eq!(parse_leading_u16("no digits"), 0);
        assert_eq!(parse_leading_u16(""), 0);
        // Wrapping, like strtoul truncated to 16 bits.
        assert_eq!(parse_leading_u16("65537"), 1);
    }

    #[test]
    fn test_logon_type_names() {
        assert_eq!(logon_type_name(2), Some("Interactive"));
        assert_eq!(logon_type_name(10), Some("RemoteInteractive"));
        assert_eq!(logon_type_name(0), None);
        assert_eq!(logon_type_name(6), None);
        assert_eq!(logon_type_name(12), None);
        assert_eq!(logon_type_name(u32::MAX), None);
    }
}
