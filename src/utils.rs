/// Formats `buffer[start..=end]` as 16-byte rows of hex followed by ASCII.
pub fn hexdump(buffer: &[u8], start: u16, end: u16) -> String {
    let mut str = String::new();
    if buffer.is_empty() {
        return str;
    }

    let end = (end as usize).min(buffer.len().saturating_sub(1));
    let mut addr = start as usize;

    while addr <= end {
        let row_end = (addr + 15).min(end);
        let row = &buffer[addr..=row_end];

        let hex: Vec<String> = row.iter().map(|b| format!("{:02x}", b)).collect();
        let chars: String = row
            .iter()
            .map(|&b| {
                let c = b as char;
                if c.is_ascii_graphic() || c == ' ' {
                    c
                } else {
                    '.'
                }
            })
            .collect();

        str.push_str(&format!("{:04x}: {:<47}  {}\n", addr, hex.join(" "), chars));
        addr = row_end + 1;
    }

    str
}
