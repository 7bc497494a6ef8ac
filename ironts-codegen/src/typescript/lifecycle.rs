//! The `lifecycle.ts` helper module.
//!
//! Declarations with lifecycle restrictions are generic over a requested
//! lifecycle and filter their shape with `FilterLifecycle`, both of which
//! live in this module.

use ironts_schema::Lifecycle;

use super::GENERATED_HEADER;

/// File name of the helper module.
pub const LIFECYCLE_FILE: &str = "lifecycle.ts";

/// Module specifier of the helper, relative to a namespace file.
pub const LIFECYCLE_MODULE: &str = "./lifecycle";

/// Generic parameter list of declarations that carry visibility.
pub const LIFECYCLE_GENERIC: &str = "<V extends Lifecycle = Lifecycle.All>";

const FILTER_LIFECYCLE: &str = r"type VisibilityEntry = {vis?: readonly Lifecycle[]; nested?: unknown};

type IsVisible<E, V> = E extends {vis: infer S extends readonly Lifecycle[]}
  ? [V & S[number]] extends [never]
    ? false
    : true
  : true;

type Nested<T, E, V extends Lifecycle> = E extends {nested: infer N}
  ? FilterLifecycle<T, N, V>
  : T;

/**
 * Removes the properties of `T` that are not visible in lifecycle `V`.
 * A property is visible if its allowed states include any state of `V`.
 * `M` describes the restrictions per property; the key `'*'` applies to
 * every value of a record.
 */
export type FilterLifecycle<T, M, V extends Lifecycle> = Lifecycle.All extends V
  ? T
  : T extends readonly (infer E)[]
    ? FilterLifecycle<E, M, V>[]
    : M extends {'*': infer W extends VisibilityEntry}
      ? {[K in keyof T]: Nested<T[K], W, V>}
      : {
          [K in keyof T as K extends keyof M
            ? IsVisible<M[K], V> extends true
              ? K
              : never
            : K]: K extends keyof M ? Nested<T[K], M[K], V> : T[K];
        };
";

/// Renders the helper module.
#[must_use]
pub fn lifecycle_module() -> String {
    let mut output = String::new();
    output.push_str(GENERATED_HEADER);
    output.push('\n');
    output.push_str("export enum Lifecycle {\n");
    output.push_str("  All = 'All',\n");
    for state in Lifecycle::ALL {
        output.push_str(&format!("  {state} = '{state}',\n"));
    }
    output.push_str("}\n\n");
    output.push_str(FILTER_LIFECYCLE);
    output
}
