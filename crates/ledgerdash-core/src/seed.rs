//! Demo data: a few months of plausible card and bank transactions

use chrono::{Duration, NaiveDate, Utc};
use ledgerdash_config::StoreConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::models::TransactionRecord;
use crate::store::InMemoryStore;

/// Days back from today the generated dates spread over (about 6 months)
const SPREAD_DAYS: i64 = 180;

/// Share of generated rows that are expenses
const EXPENSE_RATIO: f64 = 0.75;

const ACCOUNTS: &[&str] = &["CHK-001234", "CHK-005678", "SAV-001111", "CC-4532", "CC-7891"];

const LOCATIONS: &[&str] = &["Main St", "Downtown", "Online", "Local"];

/// Description and amount range in whole currency units
struct Category(&'static str, i64, i64);

const EXPENSES: &[Category] = &[
    Category("Grocery Store", -25, -150),
    Category("Electric Bill", -80, -200),
    Category("Gas Station", -30, -80),
    Category("Internet Service", -50, -100),
    Category("Mobile Phone Bill", -40, -120),
    Category("Restaurant", -15, -100),
    Category("Coffee Shop", -5, -15),
    Category("Online Shopping", -20, -300),
    Category("Subscription Service", -10, -50),
    Category("Pharmacy", -10, -80),
    Category("Home Improvement", -50, -500),
    Category("Insurance Payment", -100, -400),
    Category("Gym Membership", -30, -60),
    Category("Streaming Service", -10, -25),
    Category("Public Transit", -5, -50),
    Category("Parking", -5, -30),
    Category("Medical Copay", -20, -100),
    Category("Pet Supplies", -20, -100),
    Category("Clothing Store", -30, -200),
    Category("Electronics", -50, -800),
];

const INCOME: &[Category] = &[
    Category("Salary Deposit", 2500, 5000),
    Category("Freelance Payment", 200, 1500),
    Category("Interest Earned", 5, 50),
    Category("Refund", 20, 200),
    Category("Cash Deposit", 50, 500),
    Category("Transfer In", 100, 1000),
];

fn pick<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn generate_one<R: Rng>(rng: &mut R, user_id: &str, today: NaiveDate) -> TransactionRecord {
    let categories = if rng.gen_bool(EXPENSE_RATIO) { EXPENSES } else { INCOME };
    let Category(name, a, b) = pick(rng, categories);

    let (low, high) = ((*a).min(*b) * 100, (*a).max(*b) * 100);
    let amount = Decimal::new(rng.gen_range(low..=high), 2);

    // two of three rows use the bare category name
    let description = match rng.gen_range(0..3) {
        1 => format!("{} - {}", name, pick(rng, LOCATIONS)),
        _ => name.to_string(),
    };

    let date = today - Duration::days(rng.gen_range(0..SPREAD_DAYS));
    let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();

    TransactionRecord::new(
        id.to_string(),
        user_id,
        date,
        *pick(rng, ACCOUNTS),
        description,
        amount,
    )
}

/// `count` rows for one user dated within the last six months of `today`,
/// newest first
pub fn generate_transactions<R: Rng>(
    rng: &mut R,
    count: usize,
    user_id: &str,
    today: NaiveDate,
) -> Vec<TransactionRecord> {
    let mut rows: Vec<_> = (0..count).map(|_| generate_one(rng, user_id, today)).collect();
    rows.sort_by(crate::store::display_order);
    rows
}

/// Replace the seed user's rows with freshly generated ones.
/// Returns the number of rows inserted.
pub async fn seed_store(store: &InMemoryStore, config: &StoreConfig) -> usize {
    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let count = config.seed_count.unwrap_or_else(|| rng.gen_range(60..120));
    let today = Utc::now().date_naive();

    let rows = generate_transactions(&mut rng, count, &config.seed_user_id, today);
    let removed = store.clear_user(&config.seed_user_id).await;
    if removed > 0 {
        log::info!("seed: cleared {} existing transactions", removed);
    }
    let inserted = store.insert_many(rows).await;
    log::info!("seed: inserted {} transactions for {}", inserted, config.seed_user_id);
    inserted
}
