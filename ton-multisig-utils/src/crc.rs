/// CRC-16/XMODEM, used by user-friendly addresses
pub fn crc_16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::crc_16;

    #[test]
    fn xmodem_check_value() {
        assert_eq!(crc_16(b"123456789"), 0x31c3);
    }
}
