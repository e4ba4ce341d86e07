use crate::operations::{ModelOperation, Resolution, COMMON_MODELS, MODEL_OPERATIONS};

const PRELUDE: &str = r#"// @ts-nocheck
// Preview stand-in for the database client. Reads resolve empty, writes echo
// their input with a synthesized id. Nothing is persisted.

let sequence = 0;
const nextId = () => `mock_${Date.now().toString(36)}${(++sequence).toString(36)}`;

// Writes are recorded per model for inspection; reads ignore them.
const stores = new Map();

function remember(model, record) {
  let store = stores.get(model);
  if (!store) {
    store = [];
    stores.set(model, store);
  }
  store.push(record);
  return record;
}

const zeroCounter = (key) => ({ key, labels: {}, value: 0, description: '' });

export const metrics = Object.freeze({
  async json() {
    return {
      counters: [
        zeroCounter('prisma_client_queries_total'),
        zeroCounter('prisma_datasource_queries_total'),
        zeroCounter('prisma_pool_connections_opened_total'),
        zeroCounter('prisma_pool_connections_closed_total'),
      ],
      gauges: [],
      histograms: [],
    };
  },
  async prometheus() {
    return '';
  },
});

class MockPrismaError extends Error {
  constructor(message, meta) {
    super(message);
    Object.assign(this, meta);
  }
}

export const Prisma = {
  PrismaClientKnownRequestError: class extends MockPrismaError {},
  PrismaClientUnknownRequestError: class extends MockPrismaError {},
  PrismaClientValidationError: class extends MockPrismaError {},
  PrismaClientInitializationError: class extends MockPrismaError {},
  Decimal: Number,
  sql: (strings, ...values) => ({ strings, values }),
  join: (values) => values,
  raw: (value) => value,
  empty: '',
  JsonNull: null,
  DbNull: null,
  AnyNull: null,
};
"#;

const CLIENT_HEAD: &str = r#"
export class PrismaClient {
  constructor(options) {
    this._options = options;
    this._models = new Map();
    this.$metrics = metrics;
    return new Proxy(this, {
      get(target, prop, receiver) {
        if (typeof prop === 'symbol' || prop in target) {
          return Reflect.get(target, prop, receiver);
        }
        // Never look thenable or serializable; never invent client methods.
        if (prop === 'then' || prop === 'toJSON' || prop.startsWith('$') || prop.startsWith('_')) {
          return undefined;
        }
        return target._model(prop);
      },
    });
  }

  _model(name) {
    let model = this._models.get(name);
    if (!model) {
      model = createModel(name);
      this._models.set(name, model);
    }
    return model;
  }

  async $connect() {}

  async $disconnect() {}

  async $transaction(arg) {
    if (typeof arg === 'function') {
      return arg(this);
    }
    return Promise.all(arg ?? []);
  }

  async $queryRaw() {
    return [];
  }

  async $queryRawUnsafe() {
    return [];
  }

  async $executeRaw() {
    return 0;
  }

  async $executeRawUnsafe() {
    return 0;
  }

  async $on() {}

  $use() {}

  $extends() {
    return this;
  }
"#;

const EXPORTS: &str = r#"
const globalForPrisma = globalThis;

export const prisma =
  globalForPrisma.__previewPrisma ?? (globalForPrisma.__previewPrisma = new PrismaClient());
export const db = prisma;
export const client = prisma;
export const __mockStores = stores;

export default prisma;
"#;

/// Render the mock client module. Pure: the output depends on nothing but
/// the operation tables.
pub fn generate_mock_client() -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str(PRELUDE);

    out.push_str("\nfunction createModel(name) {\n  return {\n");
    for op in MODEL_OPERATIONS {
        out.push_str(&render_operation(op));
    }
    out.push_str("  };\n}\n");

    out.push_str(CLIENT_HEAD);
    for model in COMMON_MODELS {
        out.push_str(&format!(
            "\n  get {model}() {{\n    return this._model('{model}');\n  }}\n"
        ));
    }
    out.push_str("}\n");

    out.push_str(EXPORTS);
    out
}

fn render_operation(op: &ModelOperation) -> String {
    let body = match op.resolution {
        Resolution::List => "[]".to_owned(),
        Resolution::Single => "null".to_owned(),
        Resolution::Echo(source) => {
            format!("remember(name, {{ id: nextId(), ...({source} ?? {{}}) }})")
        }
        Resolution::Count => "0".to_owned(),
        Resolution::Batch => "({ count: 0 })".to_owned(),
        Resolution::Aggregate => {
            "({ _count: { _all: 0 }, _sum: {}, _avg: {}, _min: {}, _max: {} })".to_owned()
        }
    };
    format!("    {}: async (args) => {body},\n", op.name)
}
