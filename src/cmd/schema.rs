//! Schema command - print the expected snapshot format

use crate::core::{Card, FieldInfo, Installment, LumpSum, SnapshotEnvelope};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the snapshot payload
    JsonSchema,
    /// Field descriptions for each record type
    Fields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::Fields => {
                self.print_fields();
                Ok(())
            }
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(SnapshotEnvelope);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_fields(&self) {
        println!("Snapshot Input Format");
        println!("=====================");
        println!();
        println!("{{\"status\": \"success\", \"cards\": [..], \"lumpSums\": [..], \"installments\": [..]}}");
        print_record("cards", Card::field_schema());
        print_record("lumpSums", LumpSum::field_schema());
        print_record("installments", Installment::field_schema());
        println!();
        println!("Amounts are integers in the smallest currency unit.");
    }
}

fn print_record(name: &str, fields: &[FieldInfo]) {
    println!();
    println!("{}", name);
    for field in fields {
        let req = if field.required { "required" } else { "optional" };
        println!("  {:18} ({:8})  {}", field.name, req, field.description);
    }
}
