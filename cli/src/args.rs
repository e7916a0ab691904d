use pico_args::Arguments;
use std::path::PathBuf;

macro_rules! define_args {
    (
        $(
            $name:ident ( $flag:expr ) $required_exists:ident : $ty:ty
        ),*
    ) => {
        pub struct Args {
            $(pub $name: $ty),*
        }
        impl Args {
            pub fn parse() -> anyhow::Result<Self> {
                Self::parse_from(Arguments::from_env())
            }

            pub fn parse_from(mut args: Arguments) -> anyhow::Result<Self> {
                macro_rules! parse {
                    (required; $fflag:expr) => { args.value_from_str($fflag)? };
                    (exists; $fflag:expr) => { args.contains($fflag) };
                }

                $(
                    let $name = parse!($required_exists; $flag);
                )*

                let rest = args.finish();
                anyhow::ensure!(rest.is_empty(), "unexpected arguments: {rest:?}");

                Ok(Self {
                    $($name),*
                })
            }
        }
    };
}

define_args! {
    verbose("-v") exists: bool,
    annotate("--annotate") exists: bool,
    input(["-i", "--file"]) required: PathBuf
}
