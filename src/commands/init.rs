use anyhow::Result;
use reconcile::LocalFolder;
use std::path::Path;

use crate::Context;
use crate::ui;

/// Create an entity folder with an empty definition
pub fn run(ctx: &Context, folder: &Path) -> Result<()> {
    let existed = LocalFolder::new(folder).definition_path().exists();
    let folder = LocalFolder::init(folder)?;

    if ctx.quiet {
        return Ok(());
    }

    if existed {
        ui::info(&format!(
            "{} is already initialized",
            folder.root().display()
        ));
    } else {
        ui::success(&format!("Initialized {}", folder.root().display()));
        ui::kv("definition", &folder.definition_path().display().to_string());
        ui::kv("files", &folder.files_dir().display().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context {
            quiet: true,
            server: None,
            token: None,
        }
    }

    #[test]
    fn test_init_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("hosts").join("7");
        run(&ctx(), &root).unwrap();

        let folder = LocalFolder::new(&root);
        assert!(folder.definition_path().is_file());
        assert!(folder.files_dir().is_dir());
        assert!(folder.load_definition().unwrap().is_empty());
    }

    #[test]
    fn test_init_keeps_existing_definition() {
        let tmp = TempDir::new().unwrap();
        let folder = LocalFolder::init(tmp.path()).unwrap();
        let mut record = reconcile::Record::new();
        record.insert("name".to_string(), serde_json::json!("web"));
        folder.save_definition(&record).unwrap();

        run(&ctx(), tmp.path()).unwrap();
        assert_eq!(folder.load_definition().unwrap(), record);
    }
}
