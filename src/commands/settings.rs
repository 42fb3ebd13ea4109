// ============================================================================
// 应用设置页
// 应用名称、应用图标保存在本地设置库，每次修改立即写入
// ============================================================================

use crate::database::{AppSettings, Database, APP_ICON_KEY, APP_NAME_KEY};
use crate::services::icon::is_image_data_url;
use crate::utils::error::{AppError, AppResult};

/// 应用名称最大字符数
pub const APP_NAME_MAX_CHARS: usize = 20;

pub struct SettingsPage {
    db: Database,
    settings: AppSettings,
}

impl SettingsPage {
    /// 打开设置页并读取已保存的设置
    pub fn open(db: Database) -> AppResult<Self> {
        let settings = db.get_app_settings()?;
        Ok(Self { db, settings })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn set_app_name(&mut self, name: &str) -> AppResult<()> {
        if name.chars().count() > APP_NAME_MAX_CHARS {
            return Err(AppError::validation(format!(
                "应用名称不能超过 {} 个字符",
                APP_NAME_MAX_CHARS
            )));
        }
        self.db.save_setting(APP_NAME_KEY, name)?;
        self.settings = self.db.get_app_settings()?;
        log::info!("应用名称已更新：{}", self.settings.app_name);
        Ok(())
    }

    /// 设置图标；传 None 清除
    pub fn set_app_icon(&mut self, data_url: Option<&str>) -> AppResult<()> {
        match data_url {
            Some(url) => {
                if !is_image_data_url(url) {
                    return Err(AppError::validation("请选择图片文件"));
                }
                self.db.save_setting(APP_ICON_KEY, url)?;
                log::info!("应用图标已更新");
            }
            None => {
                self.db.remove_setting(APP_ICON_KEY)?;
                log::info!("应用图标已清除");
            }
        }
        self.settings.app_icon = data_url.map(str::to_string);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DEFAULT_APP_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_name_length_limit() {
        let mut page = SettingsPage::open(Database::in_memory().unwrap()).unwrap();
        assert_eq!(page.settings().app_name, DEFAULT_APP_NAME);

        page.set_app_name("交付控制台").unwrap();
        assert_eq!(page.settings().app_name, "交付控制台");

        let too_long = "研".repeat(APP_NAME_MAX_CHARS + 1);
        assert!(matches!(
            page.set_app_name(&too_long),
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(page.settings().app_name, "交付控制台");

        // 清空名称后显示默认名称
        page.set_app_name("").unwrap();
        assert_eq!(page.settings().app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn test_icon_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let mut page = SettingsPage::open(Database::init(dir.path()).unwrap()).unwrap();
        assert!(page.set_app_icon(Some("https://example.com/a.png")).is_err());
        page.set_app_icon(Some("data:image/png;base64,AAAA")).unwrap();
        drop(page);

        let mut page = SettingsPage::open(Database::init(dir.path()).unwrap()).unwrap();
        assert_eq!(
            page.settings().app_icon.as_deref(),
            Some("data:image/png;base64,AAAA")
        );

        page.set_app_icon(None).unwrap();
        let page = SettingsPage::open(Database::init(dir.path()).unwrap()).unwrap();
        assert_eq!(page.settings().app_icon, None);
    }
}
