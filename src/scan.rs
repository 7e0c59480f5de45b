use bytes::Bytes;

/// Splits a buffer into `\n`-terminated records.
///
/// A single `\r` right before the terminator is dropped. The last record is
/// yielded even without a terminator, and a trailing terminator does not
/// produce an extra empty record. Every line shares the input allocation.
pub struct Lines {
    rest: Bytes,
}

impl Lines {
    pub fn new(buffer: Bytes) -> Self {
        Lines { rest: buffer }
    }
}

impl Iterator for Lines {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let mut line = match self.rest.iter().position(|&b| b == b'\n') {
            Some(end) => {
                let mut line = self.rest.split_to(end + 1);
                line.truncate(end);
                line
            }
            None => std::mem::take(&mut self.rest),
        };

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        Some(line)
    }
}

/// `line` without its final byte, or `None` when there is nothing to remove.
pub fn trim_last(line: &[u8]) -> Option<&[u8]> {
    line.split_last().map(|(_, rest)| rest)
}
