// src/cli/query.rs
//! Options and help for the read-only query commands

use crate::getopt::OptionSpec;

pub const SEARCH_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag("installed-only", Some('i')),
    OptionSpec::flag("uninstalled-only", Some('u')),
    OptionSpec::flag("match-all", None),
    OptionSpec::flag("match-any", None),
    OptionSpec::flag("match-substrings", None),
    OptionSpec::flag("match-words", None),
    OptionSpec::flag("match-exact", None),
    OptionSpec::flag("search-descriptions", Some('d')),
    OptionSpec::flag("case-sensitive", Some('c')),
    OptionSpec::required("type", Some('t')),
    OptionSpec::flag("sort-by-name", None),
    // rug compatibility, we have --sort-by-repo
    OptionSpec::flag("sort-by-catalog", None),
    OptionSpec::flag("sort-by-repo", None),
    // rug compatibility, we have --repo; -c belongs to --case-sensitive
    OptionSpec::required("catalog", None),
    OptionSpec::required("repo", Some('r')),
    OptionSpec::flag("help", Some('h')),
];

pub const SEARCH_HELP: &str = "\
search [options] [querystring...]

Search for packages matching given search strings

  Command options:
    --match-all            Search for a match with all search strings (default)
    --match-any            Search for a match with any of the search strings
    --match-substrings     Matches with search strings may be partial words (default)
    --match-words          Matches with search strings may only be whole words
    --match-exact          Searches for an exact package name
-d, --search-descriptions  Search also in package summaries and descriptions.
-c, --case-sensitive       Perform case-sensitive search.
-i, --installed-only       Show only packages that are already installed.
-u, --uninstalled-only     Show only packages that are not currently installed.
-t, --type <type>          Search only for packages of the specified type.
-r, --repo <alias>         Search only in the repository specified by the alias.
    --sort-by-name         Sort packages by name (default).
    --sort-by-repo         Sort packages by repository.

* and ? wildcards can also be used within search strings.
";

pub const PATCH_CHECK_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::flag("help", Some('h')),
];

pub const PATCH_CHECK_HELP: &str = "\
patch-check (pchk)

Check for available patches

  Command options:

-r, --repo <alias|#|URI>  Check for patches only in the repository specified by the alias.
";

pub const PATCHES_OPTIONS: &[OptionSpec] = PATCH_CHECK_OPTIONS;

pub const PATCHES_HELP: &str = "\
patches (pch)

List all available patches

  Command options:

-r, --repo <alias|#|URI>  Check for patches only in the repository specified by the alias.
";

pub const LIST_UPDATES_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::required("type", Some('t')),
    OptionSpec::flag("best-effort", None),
    OptionSpec::flag("help", Some('h')),
];

pub const LIST_UPDATES_HELP: &str = "\
list-updates (lu) [options]

List all available updates

  Command options:
-t, --type <type>         Type of resolvable (package, patch, pattern, product)
                          Default: patch
-r, --repo <alias|#|URI>  List only updates from the repository specified by the alias.
    --best-effort         Do a 'best effort' approach to update, updates to
                          a lower than latest-and-greatest version are
                          also acceptable.
";

pub const XML_UPDATES_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    OptionSpec::flag("help", Some('h')),
];

pub const XML_UPDATES_HELP: &str = "\
xml-updates (xu)

Show updates and patches in xml format

  Command options:
-r, --repo <alias|#|URI>  Work only with updates from repository specified by alias.
";

pub const INFO_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("type", Some('t')),
    OptionSpec::required("repo", Some('r')),
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::flag("help", Some('h')),
];

pub const INFO_HELP: &str = "\
info (if) <name> ...

Show full information for packages

  Command options:
-r, --repo <alias|#|URI>  Work only with the repository specified by the alias.
-t, --type <type>         Type of resolvable (package, patch, pattern, product)
                          Default: package
";

/// Options of the rug `*-info` aliases
pub const RUG_INFO_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::flag("help", Some('h')),
];

pub const PATCH_INFO_HELP: &str = "\
patch-info <patchname> ...

Show detailed information for patches

This is a rug compatibility alias for 'zypper info -t patch'
";

pub const PATTERN_INFO_HELP: &str = "\
pattern-info <pattern_name> ...

Show detailed information for patterns

This is a rug compatibility alias for 'zypper info -t pattern'
";

pub const PRODUCT_INFO_HELP: &str = "\
product-info <product_name> ...

Show detailed information for products

This is a rug compatibility alias for 'zypper info -t product'
";
