use anyhow::{Context, Result};
use ceph_usage::Source;
use clap::crate_version;
use clap::{Arg, ArgMatches, Command};

#[derive(Debug)]
pub struct Arguments {
    pub source: Source,
    pub root: String,
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

        let root = args
            .value_of("root")
            .with_context(|| "no root argument")?
            .into();

        Ok(Self { source, root })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command<'static> {
    let root = Arg::new("root")
        .takes_value(true)
        .required(true)
        .help("crush root");

    let input = Arg::new("input")
        .short('i')
        .long("input")
        .takes_value(true)
        .value_name("FILE")
        .help("read report from file")
        .long_help("Read report from FILE instead of running ceph. Use - for STDIN.");

    let ceph = Arg::new("ceph")
        .long("ceph")
        .takes_value(true)
        .value_name("PATH")
        .default_value("ceph")
        .help("ceph binary");

    Command::new("ceph-usage-percent")
        .about("show average utilization of a crush root in percent")
        .version(crate_version!())
        .arg(root)
        .arg(input)
        .arg(ceph)
        .mut_arg("help", |a| {
            a.short('?').help("print help").long_help("Print help.")
        })
        .mut_arg("version", |a| {
            a.hide_short_help(true).long_help("Print version.")
        })
}
