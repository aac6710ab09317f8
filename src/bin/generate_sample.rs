//! Writes a small synthetic dataset for trying the viewer: a FASTA sequence, a
//! CT structure, a ShapeMapper profile (numbered from 1 but covering only part
//! of the sequence), RingMapper correlations and diagram coordinates.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

const LENGTH: usize = 120;
const PROFILE_START: usize = 11;

/// Helices as (5' start, 3' end, length).
const HELICES: [(usize, usize, usize); 3] = [(5, 60, 10), (20, 45, 8), (70, 110, 11)];

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn nucleotide(&mut self) -> u8 {
        b"ACGU"[(self.next_u64() % 4) as usize]
    }
}

fn complement(nt: u8) -> u8 {
    match nt {
        b'A' => b'U',
        b'U' => b'A',
        b'G' => b'C',
        _ => b'G',
    }
}

/// 1-based partner table from the helix list.
fn partners() -> Vec<usize> {
    let mut partner = vec![0; LENGTH + 1];
    for (start, end, length) in HELICES {
        for k in 0..length {
            partner[start + k] = end - k;
            partner[end - k] = start + k;
        }
    }
    partner
}

fn write_fasta(dir: &Path, sequence: &[u8]) -> Result<()> {
    let mut file = File::create(dir.join("demo.fa"))?;
    writeln!(file, ">demo synthetic RNA")?;
    for chunk in sequence.chunks(60) {
        writeln!(file, "{}", String::from_utf8_lossy(chunk))?;
    }
    Ok(())
}

fn write_ct(dir: &Path, sequence: &[u8], partner: &[usize]) -> Result<()> {
    let mut file = File::create(dir.join("demo.ct"))?;
    writeln!(file, "{LENGTH:>6}  demo")?;
    for (k, &nt) in sequence.iter().enumerate() {
        let i = k + 1;
        let next = if i == LENGTH { 0 } else { i + 1 };
        writeln!(file, "{i:>5} {} {:>5} {next:>5} {:>5} {i:>5}", nt as char, i - 1, partner[i])?;
    }
    Ok(())
}

fn write_profile(dir: &Path, sequence: &[u8], partner: &[usize], rng: &mut SimpleRng) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(dir.join("demo_profile.txt"))?;
    writer.write_record([
        "Nucleotide",
        "Sequence",
        "Modified_rate",
        "Modified_read_depth",
        "Modified_effective_depth",
        "Untreated_rate",
        "Norm_profile",
        "Norm_stderr",
    ])?;
    for i in PROFILE_START..=LENGTH {
        let background = rng.gauss(0.002, 0.0005).abs();
        let reactivity = if partner[i] == 0 {
            rng.gauss(1.0, 0.5).abs()
        } else {
            rng.gauss(0.1, 0.1).abs()
        };
        let depth = 4000.0 + rng.gauss(0.0, 300.0);
        // a couple of low-depth positions without data
        let (reactivity, stderr) = if i % 37 == 0 {
            ("nan".to_string(), "nan".to_string())
        } else {
            (format!("{reactivity:.4}"), format!("{:.4}", 0.05 + 0.1 * reactivity))
        };
        writer.write_record([
            (i - PROFILE_START + 1).to_string(),
            (sequence[i - 1] as char).to_string(),
            format!("{:.5}", background + 0.02 * rng.next_f64()),
            format!("{depth:.0}"),
            format!("{:.0}", depth * 0.95),
            format!("{background:.5}"),
            reactivity,
            stderr,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_rings(dir: &Path, partner: &[usize], rng: &mut SimpleRng) -> Result<()> {
    let mut file = File::create(dir.join("demo_rings.txt"))?;
    writeln!(file, "{LENGTH}\tWindow=1\tMetric=APC")?;
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(file);
    writer.write_record(["i", "j", "Statistic", "+/-", "Zij"])?;
    // correlations across each helix, plus background noise
    for i in 1..=LENGTH {
        let j = partner[i];
        if j > i + 6 && rng.next_f64() < 0.5 {
            let stat = 20.0 + rng.gauss(15.0, 5.0).abs();
            writer.write_record([i.to_string(), (j + 1).to_string(), format!("{stat:.1}"), "1".into(), "3.5".into()])?;
        }
    }
    for _ in 0..25 {
        let i = 1 + (rng.next_u64() as usize) % (LENGTH - 20);
        let j = i + 10 + (rng.next_u64() as usize) % (LENGTH - i - 10).max(1);
        let sign = if rng.next_f64() < 0.3 { "-1" } else { "1" };
        let stat = rng.gauss(18.0, 6.0).abs();
        writer.write_record([i.to_string(), j.to_string(), format!("{stat:.1}"), sign.into(), "2.1".into()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Positions on a meandering line; enough to exercise the overlay.
fn write_coordinates(dir: &Path, sequence: &[u8]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(dir.join("demo.coords"))?;
    writer.write_record(["Nucleotide", "x", "y"])?;
    for (k, &nt) in sequence.iter().enumerate() {
        let t = k as f64 * 0.25;
        writer.write_record([
            (nt as char).to_string(),
            format!("{:.3}", 6.0 * t.cos() + t),
            format!("{:.3}", 6.0 * t.sin()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let dir = Path::new("sample_data");
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let partner = partners();
    let mut sequence: Vec<u8> = (0..LENGTH).map(|_| rng.nucleotide()).collect();
    for i in 1..=LENGTH {
        if partner[i] > i {
            sequence[partner[i] - 1] = complement(sequence[i - 1]);
        }
    }

    write_fasta(dir, &sequence)?;
    write_ct(dir, &sequence, &partner)?;
    write_profile(dir, &sequence, &partner, &mut rng)?;
    write_rings(dir, &partner, &mut rng)?;
    write_coordinates(dir, &sequence)?;

    println!(
        "Wrote a {LENGTH} nt demo dataset ({} helices) to {}/",
        HELICES.len(),
        dir.display()
    );
    Ok(())
}
