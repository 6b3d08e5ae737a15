use chrono::{Duration, NaiveDate};

use touchpoint_dash::data::model::EXPECTED_COLUMNS;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let contract_types = ["NDA", "MSA", "SOW", "Lease", "Employment", "Vendor Agreement"];
    let priorities = ["Low", "Medium", "High", "Urgent"];
    let statuses = ["Open", "In Progress", "Completed", "Closed", "Done", "On Hold"];
    let counsel = ["A. Rivera", "J. Okafor", "M. Chen", "S. Patel"];
    let requesters = ["Sales", "Procurement", "HR", "Finance", "Operations"];

    let first_day = NaiveDate::from_ymd_opt(2025, 1, 2).expect("valid start date");
    let n_rows = 240;

    let output_path = "sample_intake.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(EXPECTED_COLUMNS)
        .expect("Failed to write header");

    for i in 0..n_rows {
        let submitted = first_day + Duration::days(rng.below(180) as i64);
        let target = submitted + Duration::days(5 + rng.below(20) as i64);
        let status = rng.pick(&statuses);
        let done = matches!(status, "Completed" | "Closed" | "Done");

        let (actual, turnaround) = if done {
            let days = 1 + rng.below(21) as i64;
            (submitted + Duration::days(days), days.to_string())
        } else {
            (submitted, String::new())
        };

        // Mix the three accepted date layouts, as real exports do.
        let submitted_text = match i % 3 {
            0 => submitted.format("%d/%m/%Y").to_string(),
            1 => submitted.format("%Y-%m-%d").to_string(),
            _ => submitted.format("%m/%d/%Y").to_string(),
        };

        let row = [
            format!("REQ-{:04}", i + 1),
            format!("{} request {}", rng.pick(&contract_types), i + 1),
            rng.pick(&requesters).to_string(),
            rng.pick(&contract_types).to_string(),
            rng.pick(&priorities).to_string(),
            status.to_string(),
            rng.pick(&counsel).to_string(),
            submitted_text,
            target.format("%Y-%m-%d").to_string(),
            if done {
                actual.format("%Y-%m-%d").to_string()
            } else {
                String::new()
            },
            turnaround,
        ];
        writer.write_record(&row).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {n_rows} intake requests to {output_path}");
}
