//! Workspace cleaning and staging against a real directory tree.

use robograde::config::settings::WorkspaceConfig;
use robograde::judge::submission::Submission;
use robograde::safety::workspace::WorkspaceManager;
use std::fs;
use std::path::Path;

fn manager(root: &Path) -> WorkspaceManager {
    WorkspaceManager::new(&WorkspaceConfig {
        root: root.to_path_buf(),
        protected_marker: "Universal_Robots".to_string(),
    })
}

fn seed(src: &Path) {
    for name in ["Universal_Robots_ROS2_Driver", "student_pkg_a", "student_pkg_b"] {
        fs::create_dir_all(src.join(name)).unwrap();
        fs::write(src.join(name).join("package.xml"), name).unwrap();
    }
    fs::write(src.join("stray.txt"), "left over").unwrap();
}

#[test]
fn test_clean_preserves_only_protected_entries() {
    let dir = tempfile::tempdir().unwrap();
    let ws = manager(dir.path());
    seed(ws.source_root());

    let report = ws.clean().unwrap();

    assert_eq!(report.preserved, vec!["Universal_Robots_ROS2_Driver"]);
    assert_eq!(
        report.removed,
        vec!["stray.txt", "student_pkg_a", "student_pkg_b"]
    );
    assert_eq!(ws.entries().unwrap(), vec!["Universal_Robots_ROS2_Driver"]);

    // A second pass has nothing left to do
    let again = ws.clean().unwrap();
    assert!(again.removed.is_empty());
}

#[test]
fn test_clean_does_not_follow_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let outside = dir.path().join("outside");
    fs::create_dir_all(&outside).unwrap();
    fs::write(outside.join("keep.txt"), "precious").unwrap();

    let ws = manager(&dir.path().join("ws"));
    fs::create_dir_all(ws.source_root()).unwrap();
    std::os::unix::fs::symlink(&outside, ws.source_root().join("linked_pkg")).unwrap();

    ws.clean().unwrap();

    assert!(ws.entries().unwrap().is_empty());
    assert!(outside.join("keep.txt").is_file());
}

#[test]
fn test_stage_after_clean_leaves_single_package() {
    let dir = tempfile::tempdir().unwrap();
    let ws = manager(&dir.path().join("ws"));
    seed(ws.source_root());

    let pkg = dir.path().join("upload").join("mover_pkg");
    fs::create_dir_all(pkg.join("mover_pkg")).unwrap();
    fs::write(pkg.join("package.xml"), "<package/>").unwrap();
    fs::write(pkg.join("mover_pkg").join("mover_node.py"), "print('go')\n").unwrap();
    let submission = Submission::from_package_dir(&pkg).unwrap();

    ws.clean().unwrap();
    let staged = ws.stage(&submission).unwrap();

    assert_eq!(staged, ws.source_root().join("mover_pkg"));
    assert!(staged.join("mover_pkg").join("mover_node.py").is_file());
    assert_eq!(
        ws.entries().unwrap(),
        vec!["Universal_Robots_ROS2_Driver", "mover_pkg"]
    );
    // The upload itself is untouched
    assert!(pkg.join("package.xml").is_file());
}
