use crate::cli::args::{CliArgs, Command};
use crate::filter::StaffPickGate;
use crate::output::OutputFormat;
use crate::store::StoreBackend;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.store.as_deref() {
        if StoreBackend::parse(raw).is_none() {
            return Err(format!(
                "invalid --store '{raw}', expected memory, file or firebase"
            ));
        }
    }
    if let Some(raw) = args.rate.as_deref() {
        crate::utils::parse_rate(raw).map_err(|e| format!("invalid --rate: {e}"))?;
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if let Some(url) = args.database_url.as_deref() {
        let lower = url.trim().to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return Err(format!("invalid --database-url '{url}', expected http(s) URL"));
        }
    }

    match &args.command {
        Command::Gallery(g) => {
            if let Some(raw) = g.staff_pick.as_deref() {
                if StaffPickGate::parse(raw).is_none() {
                    return Err(format!("invalid --staff-pick '{raw}', expected 'yes'"));
                }
            }
            if let Some(raw) = g.format.as_deref() {
                if OutputFormat::parse(raw).is_none() {
                    return Err(format!("invalid --format '{raw}', expected text or json"));
                }
            }
            for raw in g.open.iter() {
                crate::utils::parse_id_csv(raw)
                    .map_err(|e| format!("invalid --open '{raw}': {e}"))?;
            }
        }
        Command::Curate(c) => {
            for raw in c.toggle.iter() {
                crate::utils::parse_id_csv(raw)
                    .map_err(|e| format!("invalid --toggle '{raw}': {e}"))?;
            }
        }
        Command::Feature(f) => {
            if f.another > 10_000 {
                return Err("invalid --another, expected at most 10000".to_string());
            }
        }
        Command::InitConfig => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn check(argv: &[&str]) -> Result<(), String> {
        validate(&CliArgs::parse_from(argv))
    }

    #[test]
    fn accepts_plain_invocations() {
        assert!(check(&["showcase", "feature"]).is_ok());
        assert!(check(&["showcase", "gallery", "--staff-pick", "yes", "-f", "json"]).is_ok());
        assert!(check(&["showcase", "curate", "--toggle", "a,b", "--save"]).is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(check(&["showcase", "--store", "redis", "feature"]).is_err());
        assert!(check(&["showcase", "gallery", "--staff-pick", "no"]).is_err());
        assert!(check(&["showcase", "gallery", "--format", "html"]).is_err());
        assert!(check(&["showcase", "curate", "--toggle", " , "]).is_err());
        assert!(check(&["showcase", "--timeout", "0", "feature"]).is_err());
        assert!(check(&["showcase", "--database-url", "ftp://x", "feature"]).is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let args = CliArgs::parse_from(["showcase", "gallery", "--store", "memory", "-vv"]);
        assert_eq!(args.store.as_deref(), Some("memory"));
        assert_eq!(args.verbose, 2);
    }
}
