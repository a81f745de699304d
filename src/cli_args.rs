use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "Discovers trade routes in the home system and runs a small trading fleet", long_about = None)]
pub struct Cli {
    /// callsign of the agent. A new agent is registered if no token is stored for it.
    pub callsign: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_callsign_is_accepted() {
        let cli = Cli::try_parse_from(["st-trade-scout", "FLWI"]).unwrap();
        assert_eq!(cli.callsign, "FLWI");
    }

    #[test]
    fn missing_callsign_is_rejected() {
        assert!(Cli::try_parse_from(["st-trade-scout"]).is_err());
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["st-trade-scout", "FLWI", "SURPLUS"]).is_err());
    }
}
