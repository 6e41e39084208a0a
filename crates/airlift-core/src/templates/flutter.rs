//! Flutter build workflow template

use crate::types::{Platform, WorkflowSpec};

/// Renders the Flutter build workflow: one job per target platform, each a
/// fixed build/package/upload sequence. The artifact file names and branch
/// are the only per-invocation variables.
#[derive(Debug, Clone, Default)]
pub struct FlutterWorkflowTemplate;

impl FlutterWorkflowTemplate {
    /// Create a new template
    pub fn new() -> Self {
        Self
    }

    /// Render the workflow document for the given spec
    pub fn render(&self, spec: &WorkflowSpec) -> String {
        let mut workflow = String::from(
            r#"name: Build

on:
  workflow_dispatch:

permissions:
  contents: write

jobs:"#,
        );

        for platform in &spec.platforms {
            match platform {
                Platform::Ios => workflow.push_str(&self.ios_job(spec.artifact_name(Platform::Ios))),
                Platform::Android => {
                    workflow.push_str(&self.android_job(spec.artifact_name(Platform::Android)))
                }
            }
        }

        workflow.push('\n');
        workflow
    }

    fn ios_job(&self, ipa_name: &str) -> String {
        format!(
            r#"
  build-ios:
    name: iOS Build
    runs-on: macos-latest
    steps:
      - uses: actions/checkout@v3

      - uses: subosito/flutter-action@v2
        with:
          channel: 'stable'
          architecture: x64

      - run: flutter config --no-analytics
      - run: flutter pub get

      - run: pod repo update
        working-directory: ios

      - run: flutter build ios --release --no-codesign --verbose

      - name: Verify build output
        run: ls -la build/ios/iphoneos

      - run: mkdir Payload
        working-directory: build/ios/iphoneos

      - run: mv Runner.app Payload
        working-directory: build/ios/iphoneos

      - name: Zip output
        run: zip -qq -r -9 {ipa_name} Payload
        working-directory: build/ios/iphoneos

      - name: Upload binaries to release
        uses: svenstaro/upload-release-action@v2
        with:
          repo_token: ${{{{ secrets.GITHUB_TOKEN }}}}
          file: build/ios/iphoneos/{ipa_name}
          tag: v1.0
          overwrite: true
          body: "Automated build upload""#
        )
    }

    fn android_job(&self, apk_name: &str) -> String {
        format!(
            r#"
  build-android:
    name: Android Build
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v3

      - uses: subosito/flutter-action@v2
        with:
          channel: 'stable'
          architecture: x64

      - run: flutter pub get
      - run: flutter build apk --release --verbose

      - name: Upload APK to release
        uses: svenstaro/upload-release-action@v2
        with:
          repo_token: ${{{{ secrets.GITHUB_TOKEN }}}}
          file: build/app/outputs/flutter-apk/{apk_name}
          tag: v1.0
          overwrite: true
          body: "Automated build upload""#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ios_workflow() {
        let template = FlutterWorkflowTemplate::new();
        let spec = WorkflowSpec::new(vec![Platform::Ios], "main");

        let workflow = template.render(&spec);

        assert!(workflow.starts_with("name: Build"));
        assert!(workflow.contains("workflow_dispatch:"));
        assert!(workflow.contains("build-ios:"));
        assert!(workflow.contains("runs-on: macos-latest"));
        assert!(workflow.contains("flutter build ios --release --no-codesign"));
        assert!(workflow.contains("FlutterIpaExport.ipa"));
        assert!(!workflow.contains("build-android:"));
    }

    #[test]
    fn test_render_android_workflow() {
        let template = FlutterWorkflowTemplate::new();
        let spec = WorkflowSpec::new(vec![Platform::Android], "main")
            .with_artifact_name(Platform::Android, "MyApp.apk");

        let workflow = template.render(&spec);

        assert!(workflow.contains("build-android:"));
        assert!(workflow.contains("runs-on: ubuntu-latest"));
        assert!(workflow.contains("flutter build apk --release"));
        assert!(workflow.contains("MyApp.apk"));
        assert!(!workflow.contains("build-ios:"));
    }

    #[test]
    fn test_render_both_platforms() {
        let template = FlutterWorkflowTemplate::new();
        let spec = WorkflowSpec::new(vec![Platform::Ios, Platform::Android], "main");

        let workflow = template.render(&spec);

        assert!(workflow.contains("build-ios:"));
        assert!(workflow.contains("build-android:"));
        // Template escaping must leave literal GitHub expressions intact
        assert!(workflow.contains("${{ secrets.GITHUB_TOKEN }}"));
    }

    #[test]
    fn test_permissions_grant_release_upload() {
        let template = FlutterWorkflowTemplate::new();
        let spec = WorkflowSpec::new(vec![Platform::Ios], "main");

        let workflow = template.render(&spec);
        assert!(workflow.contains("permissions:\n  contents: write"));
    }
}
