use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(
    name = "cardbill",
    version,
    about = "Monthly credit card bills from lump sums and installment plans"
)]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Amount due for one billing month, per card and in total
    Bill(cmd::bill::BillCommand),
    /// Bills for a run of consecutive months
    Schedule(cmd::schedule::ScheduleCommand),
    /// Report data quality issues in a snapshot
    Validate(cmd::validate::ValidateCommand),
    /// Print the expected snapshot format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::parse();
    match opts.command {
        Command::Bill(bill) => bill.exec(),
        Command::Schedule(schedule) => schedule.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
