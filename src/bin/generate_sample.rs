use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Fibre positions across the section.
const POSITIONS: [f64; 10] = [-31.0, -18.8, 0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];

/// Ground-motion records.
const RECORDS: [&str; 5] = ["B1", "B2", "B3", "B10", "B17"];

const STEPS: usize = 400;
const DT: f64 = 0.01;

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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [-1, 1).
    fn symmetric(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }
}

/// Decaying sinusoid strain history; amplitude grows with distance from
/// the neutral axis and with the record's intensity index.
fn strain_history(position: f64, intensity: f64, rng: &mut SimpleRng) -> Vec<(f64, f64)> {
    let amplitude = 2e-4 * intensity * (1.0 + position.abs() / 20.0);
    let sign = if position < 0.0 { -1.0 } else { 1.0 };
    (0..STEPS)
        .map(|i| {
            let t = i as f64 * DT;
            let wave = (2.0 * std::f64::consts::PI * 1.5 * t).sin() * (-0.4 * t).exp();
            let noise = rng.symmetric() * amplitude * 0.02;
            (t, sign * amplitude * wave + noise)
        })
        .collect()
}

fn main() {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data/S2_sample"));
    fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);
    let mut files = 0;

    for record in RECORDS {
        let intensity: f64 = record[1..].parse().unwrap_or(1.0);
        for position in POSITIONS {
            let name = format!("S2_{record}_IDA_8.5MPa_barfiber{position}.out");
            let file = fs::File::create(out_dir.join(&name)).expect("Failed to create output file");
            let mut w = BufWriter::new(file);

            for (step, (t, strain)) in strain_history(position, intensity, &mut rng)
                .into_iter()
                .enumerate()
            {
                // One malformed line so the error log has something to show.
                if record == "B3" && position == 0.0 && step == 17 {
                    writeln!(w, "{t:.2} -1.#IND").expect("Failed to write line");
                    continue;
                }
                writeln!(w, "{t:.2} {:.6e} {strain:.8e}", strain * 2e5)
                    .expect("Failed to write line");
            }
            w.flush().expect("Failed to flush output file");
            files += 1;
        }
    }

    println!(
        "Wrote {files} barfiber files ({STEPS} steps each) to {}",
        out_dir.display()
    );
}
