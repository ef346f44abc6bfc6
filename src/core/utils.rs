/// Format bytes as a hex string with spaces, for log lines
pub fn format_hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Printable view of a device text buffer such as an answer-to-reset.
/// Control and non-ASCII bytes show as '.'.
pub fn format_printable(bytes: &[u8]) -> String {
    let printable = |b: u8| b == b' ' || b.is_ascii_graphic();
    bytes
        .iter()
        .map(|&b| if printable(b) { char::from(b) } else { '.' })
        .collect()
}

/// Short payload summary for logs: the bytes themselves only when allowed
pub fn describe_payload(bytes: &[u8], show_bytes: bool) -> String {
    if show_bytes {
        format!("{} ({} bytes)", format_hex_spaced(bytes), bytes.len())
    } else {
        format!("{} bytes", bytes.len())
    }
}

/// ISO 7816-4 meaning of an SW1/SW2 trailer, for diagnostics
pub fn describe_status_word(sw1: u8, sw2: u8) -> String {
    match (sw1, sw2) {
        (0x90, 0x00) => "Success".to_string(),
        (0x61, n) => format!("Success, {n} bytes available"),
        (0x62, _) => "Warning: State unchanged".to_string(),
        (0x63, n) if n & 0xF0 == 0xC0 => format!("Warning: Counter = {}", n & 0x0F),
        (0x63, _) => "Warning: State changed".to_string(),
        (0x64..=0x66, _) => "Error: Execution error".to_string(),
        (0x67, 0x00) => "Error: Wrong length".to_string(),
        (0x68, _) => "Error: Function in CLA not supported".to_string(),
        (0x69, 0x82) => "Error: Security status not satisfied".to_string(),
        (0x69, 0x85) => "Error: Conditions of use not satisfied".to_string(),
        (0x69, _) => "Error: Command not allowed".to_string(),
        (0x6A, 0x82) => "Error: File not found".to_string(),
        (0x6A, 0x83) => "Error: Record not found".to_string(),
        (0x6A, _) => "Error: Wrong parameters".to_string(),
        (0x6B, 0x00) => "Error: Wrong parameters P1-P2".to_string(),
        (0x6C, n) => format!("Error: Wrong Le field, exact length: {n}"),
        (0x6D, 0x00) => "Error: Instruction code not supported".to_string(),
        (0x6E, 0x00) => "Error: Class not supported".to_string(),
        (0x6F, 0x00) => "Error: No precise diagnosis".to_string(),
        _ => format!("Unknown status: {sw1:02X} {sw2:02X}"),
    }
}
