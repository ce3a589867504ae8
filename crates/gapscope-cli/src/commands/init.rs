//! The `gapscope init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("gapscope.toml").exists() {
        println!("gapscope.toml already exists, skipping.");
    } else {
        std::fs::write("gapscope.toml", SAMPLE_CONFIG)?;
        println!("Created gapscope.toml");
    }

    std::fs::create_dir_all("datasets")?;
    let example_path = std::path::Path::new("datasets/example.toml");
    if example_path.exists() {
        println!("datasets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DATASET)?;
        println!("Created datasets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit datasets/example.toml with your cohort's records");
    println!("  2. Run: gapscope validate --dataset datasets/example.toml");
    println!("  3. Run: gapscope analyze --dataset datasets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gapscope configuration

[clustering]
min_shared_topics = 3

[sync]
minutes_per_unit = 2.0

[trend]
flat_slope_threshold = 0.5

[graph]
min_overlap = 10.0

[layout]
width = 800.0
height = 600.0
charge_strength = -300.0
max_steps = 300
seed = 42

[cache]
capacity = 16
"#;

const EXAMPLE_DATASET: &str = r#"[dataset]
id = "example"
name = "Example Cohort"
primary_entity = "alex"

[[entities]]
id = "alex"
name = "Alex"
completed_units = 30
weak_topics = [
    { topic = "Fractions", intensity = 0.7, time_lost_minutes = 12.0 },
    { topic = "Ratios", intensity = 0.5, time_lost_minutes = 8.0 },
    { topic = "Percentages", intensity = 0.4, time_lost_minutes = 6.0 },
]

[[entities]]
id = "blake"
name = "Blake"
completed_units = 26
weak_topics = [
    { topic = "Fractions", intensity = 0.6, time_lost_minutes = 10.0 },
    { topic = "Ratios", intensity = 0.8, time_lost_minutes = 15.0 },
    { topic = "Percentages", intensity = 0.3, time_lost_minutes = 4.0 },
    { topic = "Geometry", intensity = 0.5, time_lost_minutes = 9.0 },
]

[[entities]]
id = "casey"
name = "Casey"
completed_units = 12
weak_topics = [{ topic = "Probability", intensity = 0.9, time_lost_minutes = 20.0 }]

[[series]]
id = "alex-scores"
entity = "alex"
label = "Weekly quiz score"
points = [
    { date = "2026-01-05", value = 58.0 },
    { date = "2026-01-12", value = 63.0 },
    { date = "2026-01-19", value = 61.0 },
    { date = "2026-01-26", value = 69.0 },
]
"#;
