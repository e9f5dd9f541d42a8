use anyhow::{Result, anyhow};
use product_analysis::loader::CsvLoader;
use product_analysis::processor::FieldClassifier;
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Usage: debug_columns <file.csv>"))?;

    println!("=== DEBUGGING COLUMN MAPPING: {} ===\n", path.display());

    let upload = CsvLoader::read_upload(&path).await?;
    let df = CsvLoader::default().load(&upload)?;
    let classifier = FieldClassifier::new();

    println!("1. Headers, inferred types and canonical names:");
    for column in df.get_columns() {
        let name = column.name().as_str();
        let canonical = classifier.classify_field(name);
        let marker = if canonical != name { "->" } else { "  " };
        println!(
            "   {:<30} {:<10} {} {}",
            name,
            format!("{}", column.dtype()),
            marker,
            canonical
        );
    }

    println!("\n2. After canonical mapping:");
    let mut mapped = df.clone();
    classifier.map_to_canonical_schema(&mut mapped)?;
    println!("   Columns: {:?}", mapped.get_column_names());

    let missing = classifier.missing_required_columns(&mapped);
    if missing.is_empty() {
        println!("\n✅ All required columns present");
    } else {
        println!("\n❌ Missing required columns: {}", missing.join(", "));
    }

    println!("\n3. First rows:");
    println!("{}", mapped.head(Some(5)));

    Ok(())
}
