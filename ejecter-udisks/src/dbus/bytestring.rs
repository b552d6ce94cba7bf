// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 reports device nodes and mount points as NUL-terminated byte arrays.

pub fn decode_c_string_bytes(bytes: &[u8]) -> String {
    let raw = match bytes.split(|b| *b == 0).next() {
        Some(v) => v,
        None => bytes,
    };

    String::from_utf8_lossy(raw).to_string()
}

pub fn decode_mount_points(mount_points: Vec<Vec<u8>>) -> Vec<String> {
    mount_points
        .into_iter()
        .map(|mp| decode_c_string_bytes(&mp))
        .filter(|decoded| !decoded.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_c_string_bytes_truncates_nul() {
        let bytes = b"/media/user/STICK\0garbage";
        assert_eq!(decode_c_string_bytes(bytes), "/media/user/STICK");
    }

    #[test]
    fn decode_mount_points_filters_empty_entries() {
        let decoded = decode_mount_points(vec![
            b"/mnt/a\0".to_vec(),
            b"\0".to_vec(),
            Vec::new(),
            b"/mnt/b".to_vec(),
        ]);

        assert_eq!(decoded, vec!["/mnt/a".to_string(), "/mnt/b".to_string()]);
    }
}
