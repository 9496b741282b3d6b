//! 配置命令

use crate::config::{AppConfig, ConfigService};
use crate::error::AppResult;

/// 写入默认配置文件；已存在时返回 false
pub fn init_config(service: &ConfigService) -> AppResult<bool> {
    if service.config_path().exists() {
        return Ok(false);
    }
    let config = service.load_file()?;
    service.save(&config)?;
    Ok(true)
}

/// 生效配置（含环境变量覆盖）
pub fn effective_config(service: &ConfigService) -> AppResult<AppConfig> {
    service.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_writes_once() {
        let dir = tempdir().unwrap();
        let service = ConfigService::with_dirs(&dir.path().join("cfg"), dir.path());

        assert!(init_config(&service).unwrap());
        assert!(service.config_path().exists());
        assert!(!init_config(&service).unwrap());

        let written = service.load_file().unwrap();
        assert_eq!(written.database_path, dir.path().join("tracklabel.sqlite3").to_string_lossy());
    }
}
