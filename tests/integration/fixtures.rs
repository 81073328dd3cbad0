//! Project trees shared by the integration tests

use std::fs;
use tempfile::TempDir;

/// Write `files` (relative path, content) into a fresh temporary directory
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (relative, content) in files {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

/// A small Django service laid out as a hexagonal application
pub fn django_hexagonal() -> TempDir {
    project(&[
        ("requirements.txt", "Django==5.0\npytest>=8\n"),
        ("manage.py", "import os\nimport sys\n\nfrom django.core.management import execute_from_command_line\n"),
        ("shop/__init__.py", ""),
        ("shop/settings.py", "INSTALLED_APPS = ['shop']\n"),
        ("shop/domain/__init__.py", ""),
        (
            "shop/domain/order.py",
            "from shop.ports.repository import OrderRepositoryPort\n\nclass Order:\n    pass\n",
        ),
        ("shop/ports/__init__.py", ""),
        ("shop/ports/repository.py", "class OrderRepositoryPort:\n    pass\n"),
        ("shop/adapters/__init__.py", ""),
        (
            "shop/adapters/orm.py",
            "from django.db import models\nfrom shop.domain.order import Order\n\nclass OrderAdapter(models.Model):\n    pass\n",
        ),
        ("tests/test_order.py", "from shop.domain.order import Order\n\ndef test_order():\n    assert Order\n"),
    ])
}
