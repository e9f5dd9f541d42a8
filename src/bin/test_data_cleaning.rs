use anyhow::Result;
use product_analysis::models::{
    ACTUAL_PRICE, DISCOUNT_PERCENTAGE, DISCOUNT_PRICE, DISCOUNT_SIZE, MAIN_CATEGORY,
    NO_OF_RATINGS, RATINGS, Upload,
};
use product_analysis::loader::CsvLoader;
use product_analysis::processor::CleaningPipeline;

const SAMPLE: &str = "\
name,main_category,sub_category,ratings,no_of_ratings,discount_price,actual_price
Lloyd 1.5 Ton Inverter AC,appliances,Air Conditioners,4.2,\"2,255\",\"₹32,999\",\"₹58,990\"
boAt Rockerz 450,tv & audio,Headphones,4.1,\"1,04,310\",\"₹1,499\",\"₹3,990\"
Cotton Kurta,,Ethnic Wear,3.9,120,₹399,₹999
Steel Water Bottle,home & kitchen,Kitchen Storage,Get,15,₹249,₹249
Running Shoes,sports,Footwear,4.4,87,₹1299,
USB-C Cable,accessories,Cables,4.0,,₹199,₹499
";

fn main() -> Result<()> {
    println!("=== TESTING DATA CLEANING ===\n");

    let upload = Upload::new("sample.csv", SAMPLE.as_bytes().to_vec());
    let raw = CsvLoader::default().load(&upload)?;

    println!("1. Raw upload:");
    println!("{}", raw);

    let pipeline = CleaningPipeline::default();
    let (cleaned, summary) = pipeline.clean(&raw)?;

    println!("\n2. After cleaning:");
    println!(
        "{}",
        cleaned.select([
            MAIN_CATEGORY,
            RATINGS,
            NO_OF_RATINGS,
            DISCOUNT_PRICE,
            ACTUAL_PRICE,
            DISCOUNT_PERCENTAGE,
            DISCOUNT_SIZE,
        ])?
    );

    println!("\n3. Summary:");
    println!(
        "   rows in: {}, rows out: {}, dropped: {}",
        summary.rows_in, summary.rows_out, summary.rows_dropped
    );
    for (column, count) in &summary.label_imputed {
        println!("   {} filled with label: {}", column, count);
    }
    for (column, count) in &summary.median_imputed {
        println!("   {} filled with median: {}", column, count);
    }
    for (column, count) in &summary.coercion_failures {
        println!("   {} unparseable: {}", column, count);
    }

    Ok(())
}
