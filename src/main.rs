// Entry point for the settlement CLI.
// Every command loads a pool, runs one epoch (or just reads the pool) and
// reports what happened; persistence goes through the sled snapshot store.
use clap::Parser;
use ledger_settlement::core::monetary::conversions::{coins_to_units, format_amount};
use ledger_settlement::{
    build_handler, owner_address, transaction_fee, Command, EcdsaP256Verifier, EpochReport,
    Opt, SettlementPolicy, SnapshotStore, TXOutput, Transaction, UTXOPool, Wallet, GLOBAL_CONFIG,
    UTXO,
};
use ledger_settlement::utils::sha256_digest;
use log::error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

fn main() {
    // RUST_LOG still wins over the configured level
    let settings = GLOBAL_CONFIG.snapshot();
    env_logger::Builder::new()
        .filter_level(settings.log_level_filter())
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Demo {
            policy,
            db,
            batch_out,
        } => {
            let policy = policy.map(Into::into).unwrap_or_else(|| GLOBAL_CONFIG.get_policy());

            // Alice owns one genesis output worth 10 coins
            let alice = Wallet::new()?;
            let bob = Wallet::new()?;
            let carol = Wallet::new()?;
            let genesis = UTXO::new(&sha256_digest(b"genesis"), 0);
            let mut pool = UTXOPool::new();
            pool.insert(genesis.clone(), TXOutput::to_wallet(coins_to_units(10.0), &alice));

            // Two spends of the same output: the first pays a lower fee
            let low_fee = Transaction::new_signed(
                &[(genesis.clone(), &alice)],
                vec![TXOutput::to_wallet(coins_to_units(9.0), &carol)],
            )?;
            let high_fee = Transaction::new_signed(
                &[(genesis, &alice)],
                vec![TXOutput::to_wallet(coins_to_units(4.0), &bob)],
            )?;
            let batch = vec![low_fee, high_fee];

            if let Some(path) = db {
                SnapshotStore::open(&path)?.save(&pool)?;
                println!("Seeded snapshot store at {}", path.display());
            }
            if let Some(path) = batch_out {
                serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &batch)?;
                println!("Wrote demo batch to {}", path.display());
            }

            println!("Policy: {policy}");
            let (report, _) = settle_and_print(policy, &pool, &batch, GLOBAL_CONFIG.is_parallel())?;
            println!(
                "Accepted {} of {} transactions",
                report.accepted.len(),
                batch.len()
            );
        }
        Command::Settle {
            batch,
            db,
            policy,
            dry_run,
        } => {
            let policy = policy.map(Into::into).unwrap_or_else(|| GLOBAL_CONFIG.get_policy());
            let store = SnapshotStore::open(db_path(db))?;
            let pool = store.load()?;
            let batch = load_batch(&batch)?;

            let (report, new_pool) =
                settle_and_print(policy, &pool, &batch, GLOBAL_CONFIG.is_parallel())?;
            println!(
                "Accepted {} of {} transactions",
                report.accepted.len(),
                batch.len()
            );

            if dry_run {
                println!("Dry run: snapshot left unchanged");
            } else {
                store.save(&new_pool)?;
                println!("Saved new snapshot");
            }
        }
        Command::Inspect { db } => {
            let store = SnapshotStore::open(db_path(db))?;
            print_pool(&store.load()?);
        }
    }
    Ok(())
}

fn db_path(db: Option<PathBuf>) -> PathBuf {
    db.unwrap_or_else(|| PathBuf::from(GLOBAL_CONFIG.get_db_path()))
}

fn load_batch(path: &Path) -> Result<Vec<Transaction>, Box<dyn std::error::Error>> {
    let batch: Vec<Transaction> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    for tx in &batch {
        // the id keys the outputs this transaction creates, so it must match
        if !tx.has_consistent_id()? {
            return Err(format!("Transaction {} has an inconsistent id", tx.get_id_hex()).into());
        }
    }
    Ok(batch)
}

fn settle_and_print(
    policy: SettlementPolicy,
    pool: &UTXOPool,
    batch: &[Transaction],
    parallel: bool,
) -> Result<(EpochReport, UTXOPool), Box<dyn std::error::Error>> {
    let mut handler = build_handler(policy, pool, Arc::new(EcdsaP256Verifier), parallel)?;
    let report = handler.handle_epoch(batch)?;
    print_report(&report, pool);
    print_pool(handler.pool());
    Ok((report, handler.pool().clone()))
}

fn print_report(report: &EpochReport, starting_pool: &UTXOPool) {
    for tx in &report.accepted {
        match transaction_fee(tx, starting_pool) {
            Some(fee) if fee <= i128::from(i64::MAX) => println!(
                "+ accepted {} (fee {})",
                tx.get_id_hex(),
                format_amount(fee as i64)
            ),
            _ => println!("+ accepted {}", tx.get_id_hex()),
        }
    }
    for rejected in &report.rejected {
        println!(
            "- rejected {}: {}",
            data_encoding::HEXLOWER.encode(&rejected.id),
            rejected.reason
        );
    }
    println!("Total fees collected: {}", report.total_fees);
}

fn print_pool(pool: &UTXOPool) {
    println!("Pool ({} outputs, total {}):", pool.len(), pool.total_value());
    for utxo in pool.all() {
        if let Some(out) = pool.get(&utxo) {
            println!(
                "  {utxo} -> {} to {}",
                format_amount(out.get_value()),
                owner_address(out.get_owner())
            );
        }
    }
}
