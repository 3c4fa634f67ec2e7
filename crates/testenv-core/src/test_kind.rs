/// The interpreted language a package's import tests are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Python,
    Perl,
}

impl Ecosystem {
    /// conda names Perl modules `perl-*`; everything else gets Python import tests.
    pub fn from_package_name(name: &str) -> Self {
        if name.starts_with("perl-") {
            Self::Perl
        } else {
            Self::Python
        }
    }

    pub fn test_kind(self) -> TestKind {
        match self {
            Self::Python => TestKind::Python,
            Self::Perl => TestKind::Perl,
        }
    }

    /// The kinds worth materializing for a package of this ecosystem, in run order.
    pub fn test_kinds(self) -> [TestKind; 2] {
        [self.test_kind(), TestKind::Shell]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestKind {
    Python,
    Perl,
    Shell,
}

impl TestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Perl => "perl",
            Self::Shell => "shell",
        }
    }

    pub fn script_name(self) -> &'static str {
        match self {
            Self::Python => "run_test.py",
            Self::Perl => "run_test.pl",
            Self::Shell if cfg!(windows) => "run_test.bat",
            Self::Shell => "run_test.sh",
        }
    }
}
