//! rsync 参数构造

use std::fmt;

use utils::app_config::RsyncConfig;

/// rsync 源路径结尾的分隔符：带分隔符时复制目录内容，而不是目录本身
pub const SEPARATOR: char = '/';

/// 归档、详细输出、压缩传输
pub const BASE_FLAGS: [&str; 3] = ["-a", "-v", "-z"];

/// 跳过目标端比源端更新的文件
pub const UPDATE_FLAG: &str = "--update";

pub const DRY_RUN_FLAG: &str = "--dry-run";

/// 一次子进程调用的完整 argv，`argv[0]` 为程序名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    argv: Vec<String>,
}

impl SyncCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args.into_iter().map(Into::into));
        Self { argv }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// 追加结尾分隔符（按字符串判断，空串也会变成 "/"）
pub fn ensure_trailing_separator(path: &str) -> String {
    if path.ends_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{}{}", path, SEPARATOR)
    }
}

/// 下载 / 上传命令构造器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    program: String,
    dry_run: bool,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::from_config(&RsyncConfig::default())
    }
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            dry_run: false,
        }
    }

    pub fn from_config(config: &RsyncConfig) -> Self {
        Self::new(config.binary.clone()).dry_run(config.dry_run)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 远端 -> 本地，远端为准（不带 `--update`）
    pub fn download(&self, remote: &str, local: &str) -> SyncCommand {
        self.build(&[], ensure_trailing_separator(remote), local.to_string())
    }

    /// 本地 -> 远端，不覆盖远端更新的文件
    pub fn upload(&self, local: &str, remote: &str) -> SyncCommand {
        self.build(&[UPDATE_FLAG], ensure_trailing_separator(local), remote.to_string())
    }

    fn build(&self, extra_flags: &[&str], source: String, destination: String) -> SyncCommand {
        let mut args: Vec<String> = BASE_FLAGS.iter().map(|flag| flag.to_string()).collect();
        args.extend(extra_flags.iter().map(|flag| flag.to_string()));
        if self.dry_run {
            args.push(DRY_RUN_FLAG.to_string());
        }
        args.push(source);
        args.push(destination);

        SyncCommand::new(self.program.clone(), args)
    }
}
