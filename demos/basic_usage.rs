use scatter::{Coordinator, Filter, Order, Projection, Record};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scatter - Basic Usage Example");
    println!("=============================");

    // 3 shards, every record stored on 2 of them.
    let coordinator = Coordinator::new(3, 2)?;

    println!("\n1. Saving records...");
    for (id, name, age) in [
        (1i64, "Ada", 36),
        (2, "Alan", 41),
        (3, "Grace", 28),
        (4, "Edsger", 52),
        (5, "Barbara", 33),
        (6, "Donald", 25),
    ] {
        let record = Record::new()
            .with("id", id)
            .with("firstName", name)
            .with("age", age);
        coordinator.save(record).await?;
    }
    println!("   ✓ Saved 6 records across 3 shards");

    println!("\n2. Querying page 0 (age > 30, ordered by age):");
    let filter = Filter::int_gt("age", 30);
    let order = Order::by_field("age").then(Order::by_field("id"));
    let projection = Projection::keep(&["id", "firstName", "age"]);

    let page = coordinator.query(0, 2, &filter, &order, &projection).await?;
    for row in &page {
        println!(
            "   {} ({})",
            row.text("firstName")?,
            row.int("age")?
        );
    }

    println!("\n3. Querying page 1:");
    let page = coordinator.query(1, 2, &filter, &order, &projection).await?;
    for row in &page {
        println!(
            "   {} ({})",
            row.text("firstName")?,
            row.int("age")?
        );
    }

    println!("\n4. Degrading one shard...");
    let downed = coordinator.degrade_random(1)?;
    println!("   shard(s) {downed:?} now offline");

    let page = coordinator.query(0, 10, &filter, &order, &projection).await?;
    println!(
        "   query still answers with {} rows (replicas cover the gap)",
        page.len()
    );

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
