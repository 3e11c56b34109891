use super::{Asset, Transform, TransformContext};
use crate::error::TransformError;

/// Normalises script text: drops a UTF-8 BOM, converts CRLF line endings and
/// guarantees exactly one trailing newline.
pub struct ScriptTransform;

impl Transform for ScriptTransform {
    fn name(&self) -> &str {
        "script"
    }

    fn apply(&self, asset: &mut Asset, _ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        let content = asset.content.strip_prefix('\u{feff}').unwrap_or(&asset.content);
        let mut normalized = content.replace("\r\n", "\n");
        let trimmed = normalized.trim_end_matches('\n').len();
        normalized.truncate(trimmed);
        normalized.push('\n');
        asset.content = normalized;
        Ok(())
    }

    fn preserves_lines(&self) -> bool {
        true
    }
}
