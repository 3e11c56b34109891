#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_defaults() {
        let cli = Cli::try_parse_from(["kiln", "build"]).unwrap();
        match cli.command {
            Command::Build(args) => {
                assert!(args.mode.is_none());
                assert!(!args.strict);
                assert!(args.project.config.is_none());
                assert!(args.project.cwd.is_none());
            }
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn build_with_every_flag() {
        let cli = Cli::try_parse_from([
            "kiln", "build", "--mode", "dev", "--strict", "--config", "site.toml", "--cwd",
            "/srv/site",
        ])
        .unwrap();
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.mode.as_deref(), Some("dev"));
                assert!(args.strict);
                assert_eq!(args.project.config, Some(PathBuf::from("site.toml")));
                assert_eq!(args.project.cwd, Some(PathBuf::from("/srv/site")));
            }
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn serve_defaults_to_development() {
        let cli = Cli::try_parse_from(["kiln", "serve", "--port", "3000"]).unwrap();
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.mode, "development");
                assert_eq!(args.port, Some(3000));
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kiln", "check", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Check(_)));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["kiln", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn rejects_invalid_port() {
        assert!(Cli::try_parse_from(["kiln", "serve", "--port", "70000"]).is_err());
    }
}
