use chrono::Utc;
use uuid::Uuid;

/// Produces record identifiers unique within one process:
/// `<millis base36>-<counter base36>-<16 hex digits>`. The counter restarts
/// whenever the millisecond changes.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last_timestamp: i64,
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&mut self, millis: i64) -> String {
        if millis != self.last_timestamp {
            self.last_timestamp = millis;
            self.counter = 0;
        }
        let counter = self.counter;
        self.counter += 1;

        let random = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{:0>4}-{}",
            to_base36(millis.unsigned_abs()),
            to_base36(counter),
            &random[..16]
        )
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
