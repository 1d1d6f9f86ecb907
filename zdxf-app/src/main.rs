use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zdxf_config::{AppConfig, ConfigError};
use zdxf_io::{
    DocumentLoader, DxfFacade, IoError, LoadedDocument, LoaderOptions, TagWriteError, TagWriter,
};

const USAGE: &str = "用法: zdxf-app [--config PATH] [--dump] [--strict] <FILE.dxf>";

#[derive(Debug, Default)]
struct CliArgs {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    dump: bool,
    strict: bool,
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let config = load_configuration(args.config.clone());
    init_logging(&config);
    info!("启动 zdxf 标签加载器");

    let Some(input) = args.input.as_ref() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let options = LoaderOptions {
        strict: args.strict || config.reader.strict,
        bucket_bits: config.table.bucket_bits,
    };
    let loader = DxfFacade::with_options(options);
    let document = match loader.load(input) {
        Ok(document) => document,
        Err(err) => {
            error!(path = %input.display(), error = %err, "加载 DXF 失败");
            std::process::exit(1);
        }
    };

    let result = if args.dump {
        dump_tags(&document)
    } else {
        print!("{}", render_summary(&document));
        Ok(())
    };
    if let Err(err) = result {
        error!(error = %err, "输出 DXF 标签失败");
        std::process::exit(1);
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump" => parsed.dump = true,
            "--strict" => parsed.strict = true,
            "--config" => {
                let Some(path) = args.next() else {
                    return Err("`--config` 需要提供配置文件路径".to_string());
                };
                parsed.config = Some(PathBuf::from(path));
            }
            other if other.starts_with("--") => {
                return Err(format!("未知参数：{other}"));
            }
            other => {
                if parsed.input.is_some() {
                    return Err(format!("只能指定一个输入文件，多余参数：{other}"));
                }
                parsed.input = Some(PathBuf::from(other));
            }
        }
    }
    Ok(parsed)
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

fn dump_tags(document: &LoadedDocument) -> Result<(), IoError> {
    let stdout = io::stdout();
    write_dump(document, BufWriter::new(stdout.lock()))
        .map(|_| ())
        .map_err(|source| IoError::WriteError {
            path: PathBuf::from("<stdout>"),
            source,
        })
}

/// 错误标签与未定义标签无法回写，跳过并记录警告。
fn write_dump<W: Write>(document: &LoadedDocument, out: W) -> Result<usize, TagWriteError> {
    let mut writer = TagWriter::new(out);
    let mut skipped = 0;
    for (index, tag) in document.tags.iter().enumerate() {
        if tag.is_error() || tag.is_undefined() {
            warn!(index, code = tag.group_code(), "跳过无法输出的标签");
            skipped += 1;
            continue;
        }
        writer.write_tag(tag)?;
    }
    writer.into_inner().flush()?;
    Ok(skipped)
}

fn render_summary(document: &LoadedDocument) -> String {
    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, object) in document.table.iter() {
        *kinds.entry(object.kind()).or_default() += 1;
    }

    let mut out = String::new();
    out.push_str(&format!("标签数量: {}\n", document.tags.len()));
    out.push_str(&format!("错误标签: {}\n", document.error_tags));
    out.push_str(&format!("对象数量: {}\n", document.table.size()));
    out.push_str(&format!("最大句柄: {}\n", document.table.max_handle()));
    out.push_str("对象类型:\n");
    for (kind, count) in kinds {
        out.push_str(&format!("  - {kind}: {count}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags_and_input() {
        let parsed = args(&["--dump", "--config", "cfg.toml", "drawing.dxf", "--strict"]).unwrap();
        assert!(parsed.dump);
        assert!(parsed.strict);
        assert_eq!(parsed.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(parsed.input, Some(PathBuf::from("drawing.dxf")));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.dxf", "b.dxf"]).is_err());
    }

    #[test]
    fn summary_counts_objects_by_kind() {
        let source = concat!(
            "  0\nSECTION\n  2\nENTITIES\n",
            "  0\nLINE\n  5\n1\n 10\n0.0\n 20\n0.0\n",
            "  0\nLINE\n  5\n2\n",
            "  0\nCIRCLE\n 40\nbad\n",
            "  0\nENDSEC\n  0\nEOF\n",
        );
        let document = DxfFacade::new().decode(source).expect("decode document");
        let summary = render_summary(&document);
        assert!(summary.contains("错误标签: 1\n"));
        assert!(summary.contains("对象数量: 3\n"));
        assert!(summary.contains("最大句柄: 3\n"));
        assert!(summary.contains("  - CIRCLE: 1\n  - LINE: 2\n"));
    }

    #[test]
    fn dump_skips_malformed_records() {
        let source = concat!(
            "  0\nSECTION\n  2\nENTITIES\n",
            "  0\nCIRCLE\n  5\n2F\n 40\nradius\n  8\n0\n",
            "  0\nENDSEC\n  0\nEOF\n",
        );
        let document = DxfFacade::new().decode(source).expect("decode document");
        assert_eq!(document.error_tags, 1);

        let mut out = Vec::new();
        let skipped = write_dump(&document, &mut out).expect("dump document");
        assert_eq!(skipped, 1);
        let text = String::from_utf8(out).expect("utf-8 output");
        assert_eq!(
            text,
            concat!(
                "  0\nSECTION\n  2\nENTITIES\n",
                "  0\nCIRCLE\n  5\n2F\n  8\n0\n",
                "  0\nENDSEC\n  0\nEOF\n",
            )
        );
    }
}
