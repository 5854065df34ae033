use folio::Store;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub name: String,
    pub age: String,
    pub contact: String,
    pub company: String,
    pub address: Address,
}

fn employees() -> Vec<User> {
    [
        ("John", "30", "TechCorp", "New York", "NY", "10001"),
        ("Jane", "25", "InnovateX", "Los Angeles", "CA", "90001"),
        ("Alice", "28", "WebSolutions", "Chicago", "IL", "60601"),
        ("Bob", "35", "DataSystems", "Houston", "TX", "77001"),
        ("Charlie", "40", "CloudTech", "Phoenix", "AZ", "85001"),
        ("David", "32", "AI Innovations", "San Diego", "CA", "92101"),
    ]
    .into_iter()
    .map(|(name, age, company, city, state, pin)| User {
        name: name.to_string(),
        age: age.to_string(),
        contact: String::new(),
        company: company.to_string(),
        address: Address {
            city: city.to_string(),
            state: state.to_string(),
            country: "USA".to_string(),
            pin_code: pin.to_string(),
        },
    })
    .collect()
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = std::env::var("FOLIO_DATA_DIR").unwrap_or_else(|_| "data".to_string());

    log::info!("Opening store at: {data_dir}");
    let db = Store::open(&data_dir)?;

    for user in employees() {
        db.write("users", &user.name, &user)?;
    }

    let records = db.read_all("users")?;
    log::info!("Read {} raw records", records.len());
    for record in &records {
        println!("{}", record.trim_end());
    }

    let users: Vec<User> = folio::decode_all(&records)?;
    for user in &users {
        println!("{user:?}");
    }

    Ok(())
}
