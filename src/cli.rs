use clap::{Parser, ValueEnum};

/// Check that a Supabase project is reachable and its `categories` table readable.
///
/// Connection settings come from the environment (`SUPABASE_URL`,
/// `SUPABASE_KEY`), optionally via a `.env` file in the working directory.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Pretty)]
    pub tracing: TracingFormat,

    /// Maximum number of category rows to fetch
    #[arg(long)]
    pub limit: Option<u32>,

    /// Columns to select from `categories`
    #[arg(long, default_value = "*")]
    pub columns: String,

    /// Extra tables to check for read access after a successful probe
    #[arg(long, value_delimiter = ',')]
    pub also: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human-readable output
    Pretty,
    /// One JSON object per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["supaprobe"]).unwrap();
        assert_eq!(args.columns, "*");
        assert_eq!(args.limit, None);
        assert!(args.also.is_empty());
        assert_eq!(args.tracing, TracingFormat::Pretty);
    }

    #[test]
    fn test_also_is_comma_separated() {
        let args = Args::try_parse_from([
            "supaprobe",
            "--also",
            "events,profiles",
            "--also",
            "tickets",
            "--limit",
            "1",
            "--tracing",
            "json",
        ])
        .unwrap();
        assert_eq!(args.also, vec!["events", "profiles", "tickets"]);
        assert_eq!(args.limit, Some(1));
        assert_eq!(args.tracing, TracingFormat::Json);
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
