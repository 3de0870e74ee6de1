//! # Seed Data Generator
//!
//! Populates an empty database with accounts and a small Indonesian
//! minimarket catalogue for development.
//!
//! ## Usage
//! ```bash
//! # 60 products (default)
//! cargo run -p kasir-server --bin seed
//!
//! # Custom amount
//! cargo run -p kasir-server --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p kasir-server --bin seed -- --db ./data/kasir.db
//! ```
//!
//! ## Accounts
//! | Username | Password   | Role    |
//! |----------|------------|---------|
//! | admin    | admin123   | ADMIN   |
//! | kasir    | kasir123   | CASHIER |
//!
//! Each product is created with an opening stock, which writes the matching
//! IN movement to the ledger.

use std::env;

use anyhow::Context;
use rand::Rng;

use kasir_core::input::{CategoryInput, CustomerInput, NewProduct, SupplierInput};
use kasir_core::{Money, Role};
use kasir_db::{Database, DbConfig};
use kasir_server::auth::hash_password;

const DEFAULT_COUNT: usize = 60;

/// Category name, SKU prefix and product names.
const CATALOGUE: &[(&str, &str, &[&str])] = &[
    (
        "Makanan",
        "MKN",
        &[
            "Indomie Goreng",
            "Indomie Kuah Soto",
            "Mie Sedaap Goreng",
            "Beras Pandan Wangi 5kg",
            "Gula Pasir 1kg",
            "Minyak Goreng 2L",
            "Kecap Manis Bango",
            "Sarden ABC",
        ],
    ),
    (
        "Minuman",
        "MNM",
        &[
            "Aqua 600ml",
            "Teh Botol Sosro",
            "Kopi Kapal Api",
            "Susu Ultra Coklat",
            "Pocari Sweat",
            "Teh Pucuk Harum",
            "Good Day Cappuccino",
            "Fanta Stroberi",
        ],
    ),
    (
        "Snack",
        "SNK",
        &[
            "Chitato Sapi Panggang",
            "Qtela Singkong",
            "Beng-Beng",
            "Tango Wafer",
            "Oreo Vanila",
            "Roma Kelapa",
            "Taro Net",
            "Silverqueen",
        ],
    ),
    (
        "Kebutuhan Rumah",
        "RMH",
        &[
            "Rinso Deterjen",
            "Sunlight Jeruk Nipis",
            "Baygon Aerosol",
            "Tisu Paseo",
            "Molto Pewangi",
            "Stella Pengharum",
        ],
    ),
    (
        "Perawatan Diri",
        "PRW",
        &[
            "Lifebuoy Sabun",
            "Pepsodent 190g",
            "Clear Shampoo",
            "Rexona Men",
            "Wardah Lip Balm",
            "Citra Hand Body",
        ],
    ),
];

const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("PT Sumber Makmur", "Budi Santoso", "021-5550123"),
    ("CV Maju Jaya", "Rina Wati", "0812-3456-7890"),
    ("PT Indo Distribusi", "Agus Salim", "031-7788990"),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ani Lestari", "0813-1111-2222"),
    ("Bayu Pratama", "0857-3333-4444"),
    ("Citra Dewi", "0821-5555-6666"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kasir_server::init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut count = DEFAULT_COUNT;
    let mut db_path = "kasir.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().context("--count must be a number")?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: {})", DEFAULT_COUNT);
                println!("  -d, --db <PATH>    Database file path (default: ./kasir.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kasir Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let admin = db
        .users()
        .create("admin", "Admin Toko", Role::Admin, &hash_password("admin123")?)
        .await?;
    db.users()
        .create("kasir", "Siti Kasir", Role::Cashier, &hash_password("kasir123")?)
        .await?;
    println!("✓ Created accounts admin / kasir");

    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (name, contact, phone) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(&SupplierInput {
                name: name.to_string(),
                contact_person: Some(contact.to_string()),
                phone: Some(phone.to_string()),
                email: None,
                address: None,
            })
            .await?;
        supplier_ids.push(supplier.id);
    }

    for (name, phone) in CUSTOMERS {
        db.customers()
            .create(&CustomerInput {
                name: name.to_string(),
                email: None,
                phone: Some(phone.to_string()),
                address: None,
            })
            .await?;
    }
    println!("✓ Created {} suppliers and {} customers", SUPPLIERS.len(), CUSTOMERS.len());

    let mut category_ids = Vec::with_capacity(CATALOGUE.len());
    for (name, _, _) in CATALOGUE {
        let category = db
            .categories()
            .create(&CategoryInput {
                name: name.to_string(),
                description: None,
            })
            .await?;
        category_ids.push(category.id);
    }

    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();
    let mut rng = rand::thread_rng();
    let mut generated = 0;

    // Cycle through the catalogue; later rounds get a variant suffix
    let names: Vec<(usize, &str, &str)> = CATALOGUE
        .iter()
        .enumerate()
        .flat_map(|(idx, (_, prefix, products))| products.iter().map(move |name| (idx, *prefix, *name)))
        .collect();

    while generated < count {
        let (category_idx, prefix, base_name) = names[generated % names.len()];
        let round = generated / names.len();
        let name = if round == 0 {
            base_name.to_string()
        } else {
            format!("{} Varian {}", base_name, round + 1)
        };

        // Rupiah, rounded to 500
        let price = rng.gen_range(4..=120) * 500;
        let cost = price * rng.gen_range(70..=85) / 100;

        let input = NewProduct {
            sku: format!("{}-{:04}", prefix, generated + 1),
            barcode: Some(format!("899{:010}", generated + 1)),
            name,
            description: None,
            price: Money::from_minor(price),
            cost: Money::from_minor(cost),
            stock: rng.gen_range(0..=120),
            min_stock: 10,
            max_stock: Some(200),
            unit: Some("pcs".to_string()),
            category_id: category_ids[category_idx].clone(),
            supplier_id: Some(supplier_ids[generated % supplier_ids.len()].clone()),
        };

        if let Err(e) = db.products().create(&admin.id, input).await {
            eprintln!("Failed to insert product {}: {}", generated + 1, e);
        }
        generated += 1;

        if generated % 100 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let search_results = db.products().search("indomie", 10).await?;
    println!("  Search 'indomie': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}
