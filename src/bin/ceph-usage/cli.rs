use anyhow::{anyhow, Context, Result};
use ceph_usage::{Source, Unit};
use clap::crate_version;
use clap::{Arg, ArgMatches, Command};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
}

#[derive(Debug)]
pub struct Arguments {
    pub source: Source,
    pub unit: Unit,
    pub format: Format,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let ceph = args
            .value_of("ceph")
            .with_context(|| "no ceph argument")?;

        let source = match args.value_of("input") {
            None => Source::Ceph(ceph.into()),
            Some("-") => Source::Stdin,
            Some(path) => Source::File(path.into()),
        };

        let unit = args
            .value_of("unit")
            .with_context(|| "no unit argument")?
            .parse()?;

        let format = match args.value_of("format") {
            Some("table") => Format::Table,
            Some("json") => Format::Json,
            other => return Err(anyhow!("unknown format: {:?}", other)),
        };

        Ok(Self {
            source,
            unit,
            format,
        })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command<'static> {
    let input = Arg::new("input")
        .short('i')
        .long("input")
        .takes_value(true)
        .value_name("FILE")
        .help("read report from file")
        .long_help(
            "Read a saved `ceph osd df tree -f json` report from FILE \
             instead of running ceph. Use - for STDIN.",
        );

    let ceph = Arg::new("ceph")
        .long("ceph")
        .takes_value(true)
        .value_name("PATH")
        .default_value("ceph")
        .help("ceph binary");

    let unit = Arg::new("unit")
        .short('u')
        .long("unit")
        .takes_value(true)
        .possible_values(["gb", "tb"])
        .ignore_case(true)
        .default_value("gb")
        .help("display unit");

    let format = Arg::new("format")
        .short('f')
        .long("format")
        .takes_value(true)
        .possible_values(["table", "json"])
        .default_value("table")
        .help("output format");

    Command::new("ceph-usage")
        .about("show ceph usage per crush root")
        .version(crate_version!())
        .arg(input)
        .arg(ceph)
        .arg(unit)
        .arg(format)
        .mut_arg("help", |a| {
            a.short('?').help("print help").long_help("Print help.")
        })
        .mut_arg("version", |a| {
            a.hide_short_help(true).long_help("Print version.")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Arguments> {
        let matches = build().try_get_matches_from(argv)?;
        Arguments::try_from(matches)
    }

    #[test]
    fn verify() {
        build().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = parse(&["ceph-usage"]).unwrap();

        assert_eq!(args.source, Source::Ceph("ceph".into()));
        assert_eq!(args.unit, Unit::Gb);
        assert_eq!(args.format, Format::Table);
    }

    #[test]
    fn input_and_options() {
        let args = parse(&["ceph-usage", "-i", "-", "-u", "tb", "-f", "json"])
            .unwrap();

        assert_eq!(args.source, Source::Stdin);
        assert_eq!(args.unit, Unit::Tb);
        assert_eq!(args.format, Format::Json);

        let args =
            parse(&["ceph-usage", "--input", "/tmp/osd-df.json"]).unwrap();
        assert_eq!(args.source, Source::File("/tmp/osd-df.json".into()));

        let args =
            parse(&["ceph-usage", "--ceph", "/opt/ceph/bin/ceph"]).unwrap();
        assert_eq!(args.source, Source::Ceph("/opt/ceph/bin/ceph".into()));
    }

    #[test]
    fn unit_ignores_case() {
        let args = parse(&["ceph-usage", "--unit", "TB"]).unwrap();

        assert_eq!(args.unit, Unit::Tb);
    }

    #[test]
    fn unknown_unit() {
        assert!(parse(&["ceph-usage", "--unit", "pb"]).is_err());
    }
}
