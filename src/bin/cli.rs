use rand::Rng;
use scatter::{Coordinator, Filter, Order, Projection, Record, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Scatter - Sharded Record Store Demo");
    println!("===================================");

    let config = StoreConfig::from_env();
    println!(
        "\nStarting coordinator with {} shards, replication factor {}",
        config.shard_count, config.replication_factor
    );
    let coordinator = Coordinator::from_config(&config)?;

    println!("\nSeeding people records...");
    seed_people(&coordinator, 40).await?;
    print_status(&coordinator).await;

    let filter = Filter::int_gt("age", 30);
    let order = Order::by_field("age").then(Order::by_field("id"));
    let projection = Projection::keep(&["id", "firstName", "age"]);

    println!("\nPaging through everyone older than 30, all shards online:");
    run_paged_query(&coordinator, &filter, &order, &projection).await?;

    let downed = coordinator.degrade_random(1)?;
    println!("\nTaking shard(s) {downed:?} offline and querying again:");
    println!("(records whose replicas all sit on downed shards drop out)");
    run_paged_query(&coordinator, &filter, &order, &projection).await?;

    coordinator.degrade_random(0)?;
    print_status(&coordinator).await;

    println!("\nDemo completed successfully!");
    Ok(())
}

async fn seed_people(
    coordinator: &Coordinator,
    count: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let first_names = [
        "Ada", "Alan", "Grace", "Edsger", "Barbara", "Donald", "Tony", "Niklaus",
    ];
    let last_names = [
        "Lovelace", "Turing", "Hopper", "Dijkstra", "Liskov", "Knuth", "Hoare", "Wirth",
    ];

    let mut rng = rand::thread_rng();
    for id in 1..=count {
        let record = Record::new()
            .with("id", id)
            .with("firstName", first_names[rng.gen_range(0..first_names.len())])
            .with("lastName", last_names[rng.gen_range(0..last_names.len())])
            .with("age", rng.gen_range(18..70))
            .with("gender", if rng.gen_bool(0.5) { "F" } else { "M" });
        coordinator.save(record).await?;
    }

    println!("   Saved {count} records");
    Ok(())
}

async fn run_paged_query(
    coordinator: &Coordinator,
    filter: &Filter,
    order: &Order,
    projection: &Projection,
) -> Result<(), Box<dyn std::error::Error>> {
    let page_size = 5;
    for page in 0.. {
        let rows = coordinator
            .query(page, page_size, filter, order, projection)
            .await?;
        if rows.is_empty() {
            break;
        }

        println!("   page {page}:");
        for row in &rows {
            println!("      {}", serde_json::to_string(row)?);
        }
        if rows.len() < page_size {
            break;
        }
    }
    Ok(())
}

async fn print_status(coordinator: &Coordinator) {
    println!("\nShard status:");
    for status in coordinator.status().await {
        println!(
            "   {} [{}] {} records",
            status.name,
            if status.online { "online" } else { "OFFLINE" },
            status.records
        );
    }
}
